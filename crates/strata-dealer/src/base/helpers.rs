use super::LAYER;
use crate::contracts::{Menu, Translator};
use serde_json::{Value, json};
use std::rc::Rc;
use strata_kernel::{AppHandle, ComponentKind, Dependency, Registry, ViewModel};

pub(crate) fn menu_item(translator: &dyn Translator, url: &str, text_key: &str) -> Value {
    json!({ "url": url, "text": translator.translate(text_key, &[]) })
}

pub struct MenuHelper {
    handle: AppHandle,
    translator: Rc<dyn Translator>,
}

impl Menu for MenuHelper {
    fn menu_items(&self) -> Vec<Value> {
        let t = self.translator.as_ref();
        vec![
            menu_item(t, "/app/dashboard", "menu_dashboard"),
            menu_item(t, "/logout", "menu_logout"),
        ]
    }

    fn prepare_menu_data(&self, this: &dyn Menu, view: &mut ViewModel, title_key: &str) {
        view.set("page_title", self.translator.translate(title_key, &[]));
        view.set("menu_items", this.menu_items());
        view.set("user_level", self.handle.request().role());
    }
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Helper, "MenuHelper", LAYER)
        .depends_on(Dependency::framework())
        .depends_on(Dependency::service("TranslatorService"))
        .provide::<dyn Menu>(|c| {
            Ok(Rc::new(MenuHelper {
                handle: crate::framework(c)?,
                translator: c.dependency::<dyn Translator>("TranslatorService")?,
            }))
        });
}
