//! # strata-dealer
//!
//! A two-layer dealership installation on top of `strata-kernel`.
//!
//! ```text
//!   layer 3  3audi   DashboardController (extends)  EmissionsController
//!                    EmissionsController_Admin      MenuHelper (extends)
//!                    EmissionsService  Accessory    ModelFactory (extends)
//!                          │
//!   layer 1  1base   AuthController  DashboardController  MenuHelper
//!                    AuthService  TranslatorService  ContextService
//!                    CarModel  Color  Extra  UserSession  ModelFactory
//! ```
//!
//! Views and JSON tables live under [`site_root`]; the configuration is
//! embedded from `site/strata.toml`.

pub mod audi;
pub mod base;
pub mod contracts;

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use strata_kernel::{App, AppHandle, Config, Construct, LayerRank, Registry, Result, RoleRank};

/// Model holding active login sessions, on the dealer connection.
pub const USER_SESSION: &str = "UserSession";

/// Dealer id of the demo installation's databases.
pub const DEMO_DEALER: u64 = 714;

const CONFIG_TOML: &str = include_str!("../site/strata.toml");

/// Directory holding the layer directories and `databases/`.
pub fn site_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("site")
}

pub fn config() -> Result<Config> {
    Config::from_toml_str(CONFIG_TOML)
}

/// Register both layers.
pub fn register(registry: &mut Registry) {
    base::register(registry);
    audi::register(registry);
}

pub fn registry() -> Registry {
    let mut registry = Registry::new();
    register(&mut registry);
    registry
}

/// A fresh per-request app over the embedded configuration.
pub fn app() -> Result<App> {
    App::new(config()?, registry(), site_root())
}

#[derive(Debug, Clone, Serialize)]
struct DemoUser {
    id_user: u64,
    name: &'static str,
    layer: LayerRank,
    level: RoleRank,
    id_dealer: u64,
    session_token: &'static str,
}

/// The signed-in user record the authenticator expects under `user`.
pub fn demo_user(layer: LayerRank, level: RoleRank) -> Value {
    let user = DemoUser {
        id_user: 42,
        name: "Alex Demo",
        layer,
        level,
        id_dealer: DEMO_DEALER,
        session_token: "demo-token",
    };
    serde_json::to_value(user).unwrap_or(Value::Null)
}

/// The framework handle a component declared with
/// [`strata_kernel::Dependency::framework`].
pub(crate) fn framework(construct: &Construct<'_>) -> Result<AppHandle> {
    let handle = construct.dependency::<AppHandle>("App")?;
    Ok(AppHandle::clone(&handle))
}
