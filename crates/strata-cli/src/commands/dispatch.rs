use crate::support::{dealer_app_or_exit, exit_with, parse_param, print_json_or_exit};
use strata_dealer::demo_user;
use strata_kernel::{Payload, RouteInfo};
use tracing::debug;

pub struct Args {
    pub controller: String,
    pub action: String,
    pub layer: Option<u32>,
    pub role: u32,
    pub params: Vec<String>,
    pub json: bool,
}

pub fn run(args: Args) {
    let app = dealer_app_or_exit();
    if let Some(layer) = args.layer {
        app.handle().set_context("user", demo_user(layer, args.role));
    }

    let params = args.params.iter().map(|raw| parse_param(raw)).collect();
    debug!(
        controller = %args.controller,
        action = %args.action,
        layer = ?args.layer,
        role = args.role,
        "simulated request"
    );
    let route = RouteInfo::action(args.controller, args.action, params);
    let response = app.run(route).unwrap_or_else(|err| exit_with(err));

    if args.json {
        print_json_or_exit(&response, "response");
        return;
    }

    println!("strata dispatch");
    println!("  Status: {}", response.status);
    for (name, value) in &response.headers {
        println!("  Header: {name}: {value}");
    }
    match &response.payload {
        Payload::View(view) => {
            println!("  View: {}", view.template);
            if let Some(path) = &view.template_path {
                println!("  Template: {}", path.display());
            }
            for (key, value) in &view.values {
                println!("    {key} = {value}");
            }
        }
        Payload::Json(body) => print_json_or_exit(body, "response body"),
        Payload::File(path) => println!("  File: {}", path.display()),
        Payload::Redirect(location) => println!("  Redirect: {location}"),
        Payload::Raw(body) => println!("{body}"),
    }
}
