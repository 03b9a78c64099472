use super::LAYER;
use crate::contracts::{EmissionsReport, Translator};
use serde_json::{Value, json};
use std::rc::Rc;
use strata_kernel::{
    ActionCall, ActionTable, ComponentKind, Controller, Dependency, FrameworkError,
    LayeredController, Payload, Registry, Response, Result, ViewModel,
};

pub struct DashboardController {
    translator: Rc<dyn Translator>,
}

/// `show(section, highlight)`: the base dashboard plus brand decoration.
/// The base action takes only `section`; the extra argument is dropped on
/// the way up.
fn show_dashboard(this: &DashboardController, call: &ActionCall<'_>) -> Result<Response> {
    let Payload::View(mut view) = call.parent_response()? else {
        return Err(FrameworkError::logic("base dashboard did not return a view"));
    };
    view.set("highlight", call.arg(1).cloned().unwrap_or(Value::Null));
    view.set(
        "brand_banner",
        this.translator.translate("dashboard_brand_banner", &[]),
    );
    Ok(Response::view(view))
}

pub struct EmissionsController {
    translator: Rc<dyn Translator>,
    emissions: Rc<dyn EmissionsReport>,
}

impl EmissionsController {
    fn report(&self, scope: &str) -> Result<Value> {
        let t = self.translator.as_ref();
        Ok(json!({
            "title": t.translate("report_models_title", &[]),
            "name_tag": t.translate("model_tag", &[]),
            "price_tag": t.translate("price_tag", &[]),
            "emissions_tag": t.translate("emissions_tag", &[]),
            "scope": scope,
            "models": self.emissions.emissions_data()?,
        }))
    }
}

fn show_report(this: &EmissionsController, _call: &ActionCall<'_>) -> Result<Response> {
    Ok(Response::json(this.report("dealer")?))
}

fn show_report_seller(this: &EmissionsController, _call: &ActionCall<'_>) -> Result<Response> {
    Ok(Response::json(this.report("seller")?))
}

/// `showReportEmissionsPage()`: the single-page shell for the report.
fn show_report_page(this: &EmissionsController, _call: &ActionCall<'_>) -> Result<Response> {
    let view = ViewModel::new("emissions")
        .at_layer(LAYER)
        .with("title", this.translator.translate("report_models_title", &[]))
        .with("data_url", "/api/report-emissions");
    Ok(Response::view(view))
}

/// Role-specialized controller for administrators.
fn show_report_admin(this: &EmissionsController, _call: &ActionCall<'_>) -> Result<Response> {
    let mut report = this.report("admin")?;
    let count = report["models"].as_array().map_or(0, Vec::len);
    report["model_count"] = json!(count);
    Ok(Response::json(report))
}

fn emissions_state(c: &strata_kernel::Construct<'_>) -> Result<EmissionsController> {
    Ok(EmissionsController {
        translator: c.dependency::<dyn Translator>("TranslatorService")?,
        emissions: c.dependency::<dyn EmissionsReport>("EmissionsService")?,
    })
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .register(ComponentKind::Controller, "DashboardController", LAYER)
        .extends()
        .depends_on(Dependency::service("TranslatorService"))
        .provide::<dyn Controller>(|c| {
            let state = DashboardController {
                translator: c.dependency::<dyn Translator>("TranslatorService")?,
            };
            let table =
                ActionTable::<DashboardController>::new().action("show", 2, show_dashboard);
            Ok(LayeredController::from_construct(c, state, table)?.into_shared())
        });

    registry
        .register(ComponentKind::Controller, "EmissionsController", LAYER)
        .depends_on(Dependency::service("TranslatorService"))
        .depends_on(Dependency::service("EmissionsService"))
        .provide::<dyn Controller>(|c| {
            let table = ActionTable::<EmissionsController>::new()
                .action("showReportEmissions", 0, show_report)
                .action("showReportEmissions_Seller", 0, show_report_seller)
                .action("showReportEmissionsPage", 0, show_report_page);
            Ok(LayeredController::from_construct(c, emissions_state(c)?, table)?
                .with_user_level_fallback()
                .into_shared())
        });

    registry
        .register(ComponentKind::Controller, "EmissionsController_Admin", LAYER)
        .depends_on(Dependency::service("TranslatorService"))
        .depends_on(Dependency::service("EmissionsService"))
        .provide::<dyn Controller>(|c| {
            let table = ActionTable::<EmissionsController>::new()
                .action("showReportEmissions", 0, show_report_admin);
            Ok(LayeredController::from_construct(c, emissions_state(c)?, table)?.into_shared())
        });
}
