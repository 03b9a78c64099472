//! Controllers: name-addressed actions with declared arity.
//!
//! A controller implementation registers an [`ActionTable`] instead of
//! relying on reflection. An action not declared locally is looked up along
//! the explicit parent chain, which gives layered controllers inheritance.

use crate::component::ComponentDescriptor;
use crate::error::{FrameworkError, Result};
use crate::parent::ActionCall;
use crate::registry::Construct;
use crate::response::Response;
use std::collections::BTreeMap;
use std::rc::Rc;

/// An action body. `C` is the controller's own state.
pub type ActionHandler<C> = fn(&C, &ActionCall<'_>) -> Result<Response>;

/// Declared actions of one controller implementation.
pub struct ActionTable<C> {
    actions: BTreeMap<String, (usize, ActionHandler<C>)>,
}

impl<C> Default for ActionTable<C> {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }
}

impl<C> ActionTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` taking `arity` parameters.
    pub fn action(mut self, name: impl Into<String>, arity: usize, handler: ActionHandler<C>) -> Self {
        self.actions.insert(name.into(), (arity, handler));
        self
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.actions.get(name).map(|(arity, _)| *arity)
    }

    pub fn handler(&self, name: &str) -> Option<ActionHandler<C>> {
        self.actions.get(name).map(|(_, handler)| *handler)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

pub trait Controller {
    fn descriptor(&self) -> &ComponentDescriptor;

    /// Arity of `action` if this implementation declares it itself.
    fn declares(&self, action: &str) -> Option<usize>;

    /// Run a locally declared action.
    fn call_declared(&self, action: &str, call: &ActionCall<'_>) -> Result<Response>;

    /// The more generic implementation this one extends.
    fn parent(&self) -> Option<&Rc<dyn Controller>>;

    /// Whether dispatch may fall back to actions of lower roles.
    fn use_user_level_fallback(&self) -> bool {
        false
    }
}

/// Find the implementation along the parent chain that declares `action`,
/// starting at `controller` itself.
pub fn find_declaring(
    controller: &Rc<dyn Controller>,
    action: &str,
) -> Option<(Rc<dyn Controller>, usize)> {
    let mut current = Some(Rc::clone(controller));
    while let Some(candidate) = current {
        if let Some(arity) = candidate.declares(action) {
            return Some((candidate, arity));
        }
        current = candidate.parent().cloned();
    }
    None
}

/// Whether `action` exists anywhere along the chain.
pub fn has_action(controller: &Rc<dyn Controller>, action: &str) -> bool {
    find_declaring(controller, action).is_some()
}

/// The standard controller: state, an action table and an optional parent.
pub struct LayeredController<C> {
    inner: C,
    table: ActionTable<C>,
    descriptor: ComponentDescriptor,
    parent: Option<Rc<dyn Controller>>,
    fallback: bool,
}

impl<C: 'static> LayeredController<C> {
    pub fn new(descriptor: ComponentDescriptor, inner: C, table: ActionTable<C>) -> Self {
        Self {
            inner,
            table,
            descriptor,
            parent: None,
            fallback: false,
        }
    }

    /// Build from factory input, picking up the constructed parent when the
    /// registration extends one.
    pub fn from_construct(construct: &Construct<'_>, inner: C, table: ActionTable<C>) -> Result<Self> {
        let mut controller = Self::new(construct.descriptor.clone(), inner, table);
        if construct.has_parent() {
            controller.parent = Some(construct.parent::<dyn Controller>()?);
        }
        Ok(controller)
    }

    pub fn with_parent(mut self, parent: Rc<dyn Controller>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_user_level_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_shared(self) -> Rc<dyn Controller> {
        Rc::new(self)
    }
}

impl<C: 'static> Controller for LayeredController<C> {
    fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    fn declares(&self, action: &str) -> Option<usize> {
        self.table.arity(action)
    }

    fn call_declared(&self, action: &str, call: &ActionCall<'_>) -> Result<Response> {
        let handler = self
            .table
            .handler(action)
            .ok_or_else(|| FrameworkError::ActionNotFound {
                controller: self.descriptor.type_name(),
                action: action.to_string(),
            })?;
        handler(&self.inner, call)
    }

    fn parent(&self) -> Option<&Rc<dyn Controller>> {
        self.parent.as_ref()
    }

    fn use_user_level_fallback(&self) -> bool {
        self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentKind;
    use std::path::PathBuf;

    fn descriptor(layer: u32, suffix: &str) -> ComponentDescriptor {
        ComponentDescriptor {
            kind: ComponentKind::Controller,
            name: "ReportController".to_string(),
            path: PathBuf::from(format!("{layer}/controllers/ReportController.rs")),
            suffix: suffix.to_string(),
            layer,
        }
    }

    fn ok(_: &(), _: &ActionCall<'_>) -> Result<Response> {
        Ok(Response::raw("ok"))
    }

    #[test]
    fn actions_are_inherited_along_the_parent_chain() {
        let base = LayeredController::new(
            descriptor(1, "Base"),
            (),
            ActionTable::<()>::new().action("show", 1, ok).action("export", 0, ok),
        )
        .into_shared();
        let specific: Rc<dyn Controller> = LayeredController::new(
            descriptor(3, "3Audi"),
            (),
            ActionTable::<()>::new().action("show", 2, ok),
        )
        .with_parent(Rc::clone(&base))
        .into_shared();

        let (declaring, arity) = find_declaring(&specific, "show").expect("declared locally");
        assert_eq!((declaring.descriptor().layer, arity), (3, 2));

        let (declaring, arity) = find_declaring(&specific, "export").expect("inherited");
        assert_eq!((declaring.descriptor().layer, arity), (1, 0));

        assert!(!has_action(&specific, "delete"));
        assert!(!specific.use_user_level_fallback());
    }
}
