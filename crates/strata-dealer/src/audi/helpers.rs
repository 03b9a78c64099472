use super::LAYER;
use crate::base::menu_item;
use crate::contracts::{Menu, Translator};
use serde_json::Value;
use std::rc::Rc;
use strata_kernel::{AppHandle, ComponentKind, Dependency, Registry, ViewModel};

/// Role rank from which management entries are shown.
const MANAGER_LEVEL: u32 = 2;

pub struct MenuHelper {
    parent: Rc<dyn Menu>,
    handle: AppHandle,
    translator: Rc<dyn Translator>,
}

impl Menu for MenuHelper {
    fn menu_items(&self) -> Vec<Value> {
        let t = self.translator.as_ref();
        let mut items = self.parent.menu_items();
        items.push(menu_item(t, "/api/report-emissions", "menu_report_emissions"));
        if self.handle.request().role() >= MANAGER_LEVEL {
            items.push(menu_item(t, "/app/spa-emissions", "menu_report_emissions_manager"));
        }
        items
    }

    fn prepare_menu_data(&self, this: &dyn Menu, view: &mut ViewModel, title_key: &str) {
        self.parent.prepare_menu_data(this, view, title_key);
        view.set("dashboard_image_url", "/3audi/img/blackBackgroundAudi.jpg");
    }
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Helper, "MenuHelper", LAYER)
        .extends()
        .depends_on(Dependency::framework())
        .depends_on(Dependency::service("TranslatorService"))
        .provide::<dyn Menu>(|c| {
            Ok(Rc::new(MenuHelper {
                parent: c.parent::<dyn Menu>()?,
                handle: crate::framework(c)?,
                translator: c.dependency::<dyn Translator>("TranslatorService")?,
            }))
        });
}
