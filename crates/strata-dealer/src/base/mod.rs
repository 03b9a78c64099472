//! Layer 1: the generic dealership installation.

mod controllers;
mod helpers;
mod models;
mod services;

pub use controllers::{AuthController, DashboardController};
pub use helpers::MenuHelper;
pub(crate) use helpers::menu_item;
pub use services::{AuthService, ContextService, TranslatorService};

use std::rc::Rc;
use strata_kernel::{
    ComponentKind, ConnectionModelFactory, LayerRank, MODEL_FACTORY, ModelFactory, Registry,
};

pub const LAYER: LayerRank = 1;

pub fn register(registry: &mut Registry) {
    services::register(registry);
    helpers::register(registry);
    controllers::register(registry);
    models::register(registry);

    registry
        .register(ComponentKind::Factory, MODEL_FACTORY, LAYER)
        .provide::<dyn ModelFactory>(|c| {
            Ok(Rc::new(ConnectionModelFactory::new(c.handle.clone())))
        });
}
