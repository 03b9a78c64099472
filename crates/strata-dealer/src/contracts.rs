//! Interfaces the dealer layers implement and consume.
//!
//! Components are injected as `Rc<dyn Trait>`; each layer's implementation
//! is registered under the same logical name.

use serde_json::Value;
use strata_kernel::{Result, ViewModel};

/// Translated UI strings. `{0}`, `{1}`, ... are replaced positionally.
pub trait Translator {
    fn translate(&self, key: &str, replacements: &[&str]) -> String;
}

/// Read access to the request context.
pub trait Context {
    fn get(&self, key: &str) -> Option<Value>;
}

/// Main navigation.
///
/// `this` is the most specific menu in the chain, so a generic routine
/// still sees the items of the layer that overrides it.
pub trait Menu {
    fn menu_items(&self) -> Vec<Value>;
    fn prepare_menu_data(&self, this: &dyn Menu, view: &mut ViewModel, title_key: &str);
}

pub trait EmissionsReport {
    fn emissions_data(&self) -> Result<Vec<Value>>;
}
