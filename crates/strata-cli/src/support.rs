use serde_json::Value;
use strata_kernel::{App, FrameworkError};
use tracing_subscriber::EnvFilter;

/// `-v` wins over `RUST_LOG`; the default is `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn exit_with(err: FrameworkError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

pub fn dealer_app_or_exit() -> App {
    strata_dealer::app().unwrap_or_else(|err| exit_with(err))
}

/// `--param` values: JSON when they parse, plain strings otherwise.
pub fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub fn print_json_or_exit<T: serde::Serialize + ?Sized>(value: &T, what: &str) {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|err| {
        eprintln!("error: failed to render {what}: {err}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_prefer_json() {
        assert_eq!(parse_param("2"), json!(2));
        assert_eq!(parse_param("[1,2]"), json!([1, 2]));
        assert_eq!(parse_param("sales"), json!("sales"));
        assert_eq!(parse_param("\"7\""), json!("7"));
    }
}
