use crate::support::{dealer_app_or_exit, exit_with, print_json_or_exit};
use serde_json::json;
use strata_kernel::{ComponentKind, ResolveOptions};

pub struct Args {
    pub kind: String,
    pub name: String,
    pub layer: Option<u32>,
    pub exact: bool,
    pub all: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let kind: ComponentKind = args.kind.parse().unwrap_or_else(|err: String| {
        eprintln!("error: {err}");
        std::process::exit(1);
    });
    let app = dealer_app_or_exit();
    let handle = app.handle();

    let mut options = ResolveOptions::at(args.layer).exact(args.exact);
    if args.all {
        options = options.collecting();
    }
    // Views are template files; every other kind lives in the registry.
    let resolution = match kind {
        ComponentKind::View => handle.find_files(kind, &args.name, options),
        _ => handle.find_components(kind, &args.name, options),
    }
    .unwrap_or_else(|err| exit_with(err));

    if args.json {
        print_json_or_exit(
            &json!({
                "kind": kind,
                "name": args.name,
                "selected": resolution.selected,
                "chain": resolution.chain,
            }),
            "resolution",
        );
    } else {
        println!("strata resolve");
        println!("  Kind: {kind}");
        println!("  Name: {}", args.name);
        match &resolution.selected {
            Some(descriptor) => {
                println!("  Selected: {}", descriptor.type_name());
                println!("  Layer: {}", descriptor.layer);
                println!("  Path: {}", descriptor.path.display());
            }
            None => println!("  Selected: (none)"),
        }
        for descriptor in &resolution.chain {
            println!("  - {descriptor}");
        }
    }

    if resolution.selected.is_none() {
        std::process::exit(1);
    }
}
