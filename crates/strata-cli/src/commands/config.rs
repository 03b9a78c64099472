use crate::support::{exit_with, print_json_or_exit};
use serde_json::Value;
use strata_kernel::Config;

pub fn get(path: String, config_path: Option<String>, json_output: bool) {
    let config = match config_path.as_deref() {
        Some(file) => Config::load(file),
        None => strata_dealer::config(),
    }
    .unwrap_or_else(|err| exit_with(err));

    let Some(value) = config.get(path.as_str()) else {
        eprintln!("error: no value at `{path}`");
        std::process::exit(1);
    };

    if json_output {
        print_json_or_exit(value, "config value");
        return;
    }
    match value {
        Value::String(text) => println!("{text}"),
        Value::Object(_) | Value::Array(_) => print_json_or_exit(value, "config value"),
        other => println!("{other}"),
    }
}
