use super::LAYER;
use crate::contracts::{Context, Menu, Translator};
use serde_json::{Value, json};
use std::rc::Rc;
use strata_kernel::{
    ActionCall, ActionTable, AppHandle, ComponentKind, Controller, Dependency, LayeredController,
    Registry, Response, Result, ViewModel,
};

pub struct AuthController {
    handle: AppHandle,
    translator: Rc<dyn Translator>,
}

fn show_login(this: &AuthController, _call: &ActionCall<'_>) -> Result<Response> {
    let t = this.translator.as_ref();
    let mut view = ViewModel::new("login")
        .with("login_page_title", t.translate("login_page_title", &[]))
        .with(
            "login_form_username_placeholder",
            t.translate("login_form_username_placeholder", &[]),
        )
        .with(
            "login_form_password_placeholder",
            t.translate("login_form_password_placeholder", &[]),
        )
        .with("login_form_submit_button", t.translate("login_form_submit_button", &[]))
        .with("login_userlevel_test", t.translate("login_userlevel_warning", &[]))
        .with("scripts", json!(["/js/1base/login_base.js", "/js/common/utils.js"]));

    let brand = this.handle.brand_name()?;
    view.set("login_header_brand", t.translate("login_header_brand", &[brand.as_str()]));
    view.set("login_background_image_url", "/1base/img/backgroundBase.jpeg");

    view.remove("scripts");
    view.add("scripts", "/1base/js/login_base.js");
    Ok(Response::view(view))
}

fn show_login_seller(this: &AuthController, call: &ActionCall<'_>) -> Result<Response> {
    let mut response = call.invoke("showLogin", Vec::new())?;
    if let Some(view) = response.view_model_mut() {
        view.set(
            "login_userlevel_test",
            this.translator.translate("login_userlevel_joke", &[]),
        );
    }
    Ok(response)
}

fn do_logout(_: &AuthController, _call: &ActionCall<'_>) -> Result<Response> {
    Ok(Response::redirect("/login")
        .with_header("Set-Cookie", "session_token=; Max-Age=0; Path=/"))
}

pub struct DashboardController {
    translator: Rc<dyn Translator>,
    menu: Rc<dyn Menu>,
    context: Rc<dyn Context>,
}

/// `show(section)`
fn show_dashboard(this: &DashboardController, call: &ActionCall<'_>) -> Result<Response> {
    let section = call.arg_str(0).unwrap_or("overview");
    let user_name = this
        .context
        .get("user")
        .and_then(|user| user.get("name").cloned())
        .unwrap_or(Value::Null);
    let mut view = ViewModel::new("dashboard")
        .with("section", section)
        .with("user_name", user_name)
        .with("welcome", this.translator.translate("dashboard_welcome", &[section]));
    this.menu
        .prepare_menu_data(this.menu.as_ref(), &mut view, "dashboard_title");
    Ok(Response::view(view))
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Controller, "AuthController", LAYER)
        .depends_on(Dependency::framework())
        .depends_on(Dependency::service("TranslatorService"))
        .provide::<dyn Controller>(|c| {
            let state = AuthController {
                handle: crate::framework(c)?,
                translator: c.dependency::<dyn Translator>("TranslatorService")?,
            };
            let table = ActionTable::<AuthController>::new()
                .action("showLogin", 0, show_login)
                .action("showLogin_Seller", 0, show_login_seller)
                .action("doLogout", 0, do_logout);
            Ok(LayeredController::from_construct(c, state, table)?.into_shared())
        });

    registry
        .register(ComponentKind::Controller, "DashboardController", LAYER)
        .depends_on(Dependency::service("TranslatorService"))
        .depends_on(Dependency::service("ContextService"))
        .depends_on(Dependency::helper("MenuHelper"))
        .provide::<dyn Controller>(|c| {
            let state = DashboardController {
                translator: c.dependency::<dyn Translator>("TranslatorService")?,
                menu: c.dependency::<dyn Menu>("MenuHelper")?,
                context: c.dependency::<dyn Context>("ContextService")?,
            };
            let table =
                ActionTable::<DashboardController>::new().action("show", 1, show_dashboard);
            Ok(LayeredController::from_construct(c, state, table)?.into_shared())
        });
}
