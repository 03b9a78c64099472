//! Layer 3: the Audi brand installation.
//!
//! Overrides the base dashboard and menu, adds the emissions report and a
//! `product` model connection for brand accessories.

mod controllers;
mod helpers;
mod services;

pub use controllers::{DashboardController, EmissionsController};
pub use helpers::MenuHelper;
pub use services::{EmissionsService, format_price};

use serde_json::Value;
use std::rc::Rc;
use strata_kernel::{
    AppHandle, ComponentKind, LayerRank, MODEL_FACTORY, ModelFactory, Registry, Result, Shared,
    Table, open_model,
};

pub const LAYER: LayerRank = 3;

pub const PRODUCT_CONNECTION: &str = "product";

/// Opens `product` models on `{brand}_product` and defers every other
/// connection type to the base factory.
pub struct ModelFactoryAudi {
    parent: Rc<dyn ModelFactory>,
    handle: AppHandle,
}

impl ModelFactory for ModelFactoryAudi {
    fn create(
        &self,
        model: &str,
        connection_type: Option<&str>,
        args: Vec<Value>,
        layer: LayerRank,
    ) -> Result<Shared> {
        if connection_type == Some(PRODUCT_CONNECTION) {
            let database = format!("{}_product", self.handle.brand_name()?);
            return open_model(&self.handle, model, &database, args, layer);
        }
        self.parent.create(model, connection_type, args, layer)
    }
}

pub fn register(registry: &mut Registry) {
    services::register(registry);
    helpers::register(registry);
    controllers::register(registry);

    registry
        .register(ComponentKind::Model, "Accessory", LAYER)
        .provide::<Table>(|c| {
            Ok(Rc::new(
                Table::from_construct(c, "accessories", "id_accessory")?.searchable(&["id_model"]),
            ))
        });

    registry
        .register(ComponentKind::Factory, MODEL_FACTORY, LAYER)
        .extends()
        .provide::<dyn ModelFactory>(|c| {
            Ok(Rc::new(ModelFactoryAudi {
                parent: c.parent::<dyn ModelFactory>()?,
                handle: c.handle.clone(),
            }))
        });
}
