//! End-to-end requests against the demo installation.

use serde_json::{Value, json};
use strata_dealer::{app, config, demo_user, registry, site_root};
use strata_kernel::{
    App, Config, Dispatcher, FrameworkError, Payload, Response, RouteInfo, Strategy, Table,
    ViewModel,
};

fn signed_in(layer: u32, level: u32) -> App {
    let app = app().expect("demo app builds");
    app.handle().set_context("user", demo_user(layer, level));
    app
}

fn view(response: &Response) -> &ViewModel {
    response.view_model().expect("response carries a view")
}

fn json_body(response: &Response) -> &Value {
    match &response.payload {
        Payload::Json(body) => body,
        other => panic!("expected json payload, got {other:?}"),
    }
}

fn emissions_route() -> RouteInfo {
    RouteInfo::action("EmissionsController", "showReportEmissions", Vec::new())
}

#[test]
fn guest_is_rewritten_to_the_login_page() {
    let app = app().expect("demo app builds");
    let response = app.run(emissions_route()).expect("guest request succeeds");

    let view = view(&response);
    assert_eq!(view.template, "login");
    assert_eq!(view.get("login_header_brand"), Some(&json!("Welcome to audi")));
    assert_eq!(view.get("scripts"), Some(&json!(["/1base/js/login_base.js"])));
    assert_eq!(
        view.template_path.as_deref(),
        Some(site_root().join("1base/views/login.xsl").as_path())
    );
    assert_eq!(app.handle().request().layer(), None);
}

#[test]
fn seller_login_page_extends_the_default_action() {
    let app = signed_in(1, 1);
    let response = app
        .run(RouteInfo::action("AuthController", "showLogin", Vec::new()))
        .expect("seller login page renders");

    let view = view(&response);
    assert_eq!(
        view.get("login_userlevel_test"),
        Some(&json!("Sellers sign in here. Managers use the back door."))
    );
    assert_eq!(view.get("login_page_title"), Some(&json!("Sign in")));
}

#[test]
fn brand_dashboard_decorates_the_base_dashboard() {
    let app = signed_in(3, 1);
    let route = RouteInfo::action(
        "DashboardController",
        "show",
        vec![json!("sales"), json!("new-a6")],
    );
    let response = app.run(route).expect("dashboard renders");

    let view = view(&response);
    assert_eq!(view.template, "dashboard");
    assert_eq!(
        view.get("welcome"),
        Some(&json!("Welcome back, you are viewing sales"))
    );
    assert_eq!(view.get("highlight"), Some(&json!("new-a6")));
    assert_eq!(view.get("brand_banner"), Some(&json!("Vorsprung durch Technik")));
    assert_eq!(view.get("user_name"), Some(&json!("Alex Demo")));
    assert_eq!(
        view.get("dashboard_image_url"),
        Some(&json!("/3audi/img/blackBackgroundAudi.jpg"))
    );
    assert_eq!(
        view.template_path.as_deref(),
        Some(site_root().join("3audi/views/dashboard.xsl").as_path())
    );
}

#[test]
fn brand_menu_is_seen_through_the_generic_dashboard() {
    let app = signed_in(3, 2);
    let response = app
        .run(RouteInfo::action("DashboardController", "show", Vec::new()))
        .expect("dashboard renders");

    let menu = view(&response).get("menu_items").expect("menu is prepared");
    insta::assert_json_snapshot!(menu, @r#"
    [
      {
        "text": "Dashboard",
        "url": "/app/dashboard"
      },
      {
        "text": "Sign out",
        "url": "/logout"
      },
      {
        "text": "Emissions report",
        "url": "/api/report-emissions"
      },
      {
        "text": "Emissions report (interactive)",
        "url": "/app/spa-emissions"
      }
    ]
    "#);
    assert_eq!(view(&response).get("user_level"), Some(&json!(2)));
}

#[test]
fn base_layer_user_never_sees_brand_components() {
    let app = signed_in(1, 1);
    let response = app
        .run(RouteInfo::action("DashboardController", "show", Vec::new()))
        .expect("dashboard renders");

    let view = view(&response);
    assert_eq!(view.get("menu_items").and_then(Value::as_array).map(Vec::len), Some(2));
    assert_eq!(view.get("brand_banner"), None);
    assert_eq!(
        view.template_path.as_deref(),
        Some(site_root().join("1base/views/dashboard.xsl").as_path())
    );

    let err = signed_in(1, 1)
        .run(emissions_route())
        .expect_err("brand controller is out of reach");
    assert!(err.is_missing(strata_kernel::ComponentKind::Controller, "EmissionsController"));
    assert_eq!(err.status(), 404);
}

#[test]
fn each_role_reaches_its_emissions_report() {
    let seller = signed_in(3, 1);
    let response = seller.run(emissions_route()).expect("seller report");
    assert_eq!(json_body(&response)["scope"], json!("seller"));

    let manager = signed_in(3, 2);
    let response = manager.run(emissions_route()).expect("manager report");
    assert_eq!(json_body(&response)["scope"], json!("seller"));

    let admin = signed_in(3, 3);
    let response = admin.run(emissions_route()).expect("admin report");
    let body = json_body(&response);
    assert_eq!(body["scope"], json!("admin"));
    assert_eq!(body["model_count"], json!(3));
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn dispatch_strategies_are_observable() {
    let cases = [
        (1, Strategy::SpecializedAction),
        (2, Strategy::LowerRoleFallback),
        (3, Strategy::SpecializedController),
    ];
    for (level, expected) in cases {
        let app = signed_in(3, level);
        app.handle().set_user_layer(3);
        app.handle().set_user_level(level);
        let (_, strategy) = Dispatcher::new(app.handle())
            .dispatch_traced("EmissionsController", "showReportEmissions", &[])
            .expect("report dispatches");
        assert_eq!(strategy, expected, "level {level}");
    }

    let app = signed_in(3, 1);
    app.handle().set_user_layer(3);
    app.handle().set_user_level(1);
    let (_, strategy) = Dispatcher::new(app.handle())
        .dispatch_traced("EmissionsController", "showReportEmissionsPage", &[])
        .expect("page dispatches");
    assert_eq!(strategy, Strategy::DefaultAction);

    // A role without a suffix never reaches the lower-role actions.
    let app = signed_in(3, 5);
    app.handle().set_user_layer(3);
    app.handle().set_user_level(5);
    let (response, strategy) = Dispatcher::new(app.handle())
        .dispatch_traced("EmissionsController", "showReportEmissions", &[])
        .expect("report dispatches");
    assert_eq!(strategy, Strategy::DefaultAction);
    assert_eq!(json_body(&response)["scope"], json!("dealer"));
}

#[test]
fn repeated_requests_on_one_app_dispatch_the_same_way() {
    let app = signed_in(1, 1);
    let route = || RouteInfo::action("DashboardController", "show", vec![json!("stock")]);

    let first = app.run(route()).expect("first request");
    let second = app.run(route()).expect("second request");
    assert_eq!(first, second);
    assert_eq!(
        view(&second).get("welcome"),
        Some(&json!("Welcome back, you are viewing stock"))
    );
}

#[test]
fn report_page_template_is_pinned_to_the_brand_layer() {
    let app = signed_in(3, 1);
    let response = app
        .run(RouteInfo::action("EmissionsController", "showReportEmissionsPage", Vec::new()))
        .expect("page renders");

    let view = view(&response);
    assert_eq!(view.layer, Some(3));
    assert_eq!(view.get("data_url"), Some(&json!("/api/report-emissions")));
    assert_eq!(
        view.template_path.as_deref(),
        Some(site_root().join("3audi/views/emissions.xsl").as_path())
    );
}

#[test]
fn emissions_are_formatted_from_the_master_database() {
    let app = signed_in(3, 3);
    let response = app.run(emissions_route()).expect("admin report");
    let body = json_body(&response);

    assert_eq!(
        body["models"][1],
        json!({ "name": "A4 Avant", "price": "44.900,50 €", "emissions": "134 g/km" })
    );
    assert_eq!(body["models"][2]["emissions"], json!("0 g/km"));
    assert_eq!(
        app.handle().open_connections(),
        vec!["audi_714".to_string(), "audi_master".to_string()]
    );
}

#[test]
fn inactive_session_is_rejected() {
    let app = app().expect("demo app builds");
    let mut user = demo_user(3, 1);
    user["session_token"] = json!("stale-token");
    app.handle().set_context("user", user);

    let err = app.run(emissions_route()).expect_err("stale session");
    assert!(matches!(err, FrameworkError::Action { status: 401, .. }));
    assert_eq!(app.handle().request().layer(), None);
}

#[test]
fn out_of_range_user_layer_is_treated_as_a_guest() {
    let app = app().expect("demo app builds");
    let mut user = demo_user(3, 1);
    user["layer"] = json!(u64::from(u32::MAX) + 4);
    app.handle().set_context("user", user);

    let response = app.run(emissions_route()).expect("guest request succeeds");
    assert_eq!(view(&response).template, "login");
    assert_eq!(app.handle().request().layer(), None);
    assert_eq!(app.handle().request().role(), 0);
}

#[test]
fn extras_are_searchable_by_name_only() {
    let app = signed_in(1, 1);
    app.handle().set_user_layer(1);

    let extras = app.handle().model::<Table>("Extra").expect("extra model");
    let found = extras
        .find_by("name", &json!("Matrix LED headlights"))
        .expect("name is searchable");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id_extra"], json!(100));
    assert!(extras.find_by("id_model", &json!(1)).is_err());
}

#[test]
fn brand_factory_serves_the_product_connection() {
    let app = signed_in(3, 1);
    app.handle().set_user_layer(3);

    let accessories = app.handle().model::<Table>("Accessory").expect("accessory model");
    assert_eq!(accessories.database(), "audi_product");
    assert_eq!(
        accessories
            .find_by("id_model", &json!(1))
            .expect("searchable column")
            .len(),
        2
    );

    let colors = app.handle().model::<Table>("Color").expect("color model");
    assert_eq!(colors.database(), "audi_master");
    assert!(colors.find_by("name", &json!("Mythos Black")).is_err());
}

#[test]
fn base_factory_rejects_the_product_connection() {
    let app = signed_in(1, 1);
    app.handle().set_user_layer(1);

    let err = app
        .handle()
        .get_model("Accessory", Vec::new(), None, false)
        .expect_err("base layer has no product connection");
    assert!(matches!(err, FrameworkError::Configuration(_)));
}

#[test]
fn debug_impersonation_overrides_the_signed_in_user() {
    let mut tree = config().expect("config parses").tree().clone();
    tree["debug"] = json!({
        "enabled": true,
        "panel": true,
        "fixed_user_layer": 1,
        "fixed_user_level": 2
    });
    let config = Config::from_value(tree).expect("patched config");
    let app = App::new(config, registry(), site_root()).expect("app builds");
    app.handle().set_context("user", demo_user(3, 3));

    let response = app
        .run(RouteInfo::action("DashboardController", "show", Vec::new()))
        .expect("dashboard renders");
    assert_eq!(app.handle().request().layer(), Some(1));
    assert_eq!(view(&response).get("user_level"), Some(&json!(2)));
    assert_eq!(view(&response).get("brand_banner"), None);
}

#[test]
fn legacy_scripts_are_served_from_inside_the_root() {
    let app = app().expect("demo app builds");
    let response = app
        .run(RouteInfo::legacy("legacy/stock_report.html", "stock_report"))
        .expect("legacy script found");
    assert_eq!(
        response.payload,
        Payload::File(site_root().join("legacy/stock_report.html"))
    );

    let err = app
        .run(RouteInfo::legacy("../Cargo.toml", "escape"))
        .expect_err("paths may not leave the root");
    assert!(matches!(err, FrameworkError::LegacyScriptNotFound(name) if name == "escape"));
}

#[test]
fn logout_clears_the_session_cookie() {
    let app = signed_in(1, 1);
    let response = app
        .run(RouteInfo::action("AuthController", "doLogout", Vec::new()))
        .expect("logout");
    assert_eq!(response.status, 302);
    assert_eq!(response.payload, Payload::Redirect("/login".to_string()));
    assert_eq!(
        response.headers.get("Set-Cookie").map(String::as_str),
        Some("session_token=; Max-Age=0; Path=/")
    );
}
