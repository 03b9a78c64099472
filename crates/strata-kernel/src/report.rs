//! Failure reports for uncaught request errors.
//!
//! A report names the error variant and message, lists the action frames
//! that were active when it was raised (innermost first, arguments
//! pretty-printed and length-limited), and the error's source chain.

use crate::error::FrameworkError;
use crate::parent::FrameSnapshot;
use chrono::{DateTime, Local};
use serde_json::Value;
use std::error::Error as _;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

const SEPARATOR_WIDTH: usize = 80;
const TRUNCATED: &str = "... (truncated)";

/// Render a report. `arg_limit == 0` disables argument truncation.
pub fn render(
    err: &FrameworkError,
    frames: &[FrameSnapshot],
    arg_limit: usize,
    at: DateTime<Local>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}]", at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "{}: \"{}\"", err.variant_name(), err);
    out.push_str("\nStack trace:\n");
    for (i, frame) in frames.iter().enumerate() {
        let _ = writeln!(
            out,
            "#{i} {}->{}({})",
            frame.component,
            frame.method,
            format_args_list(&frame.args, arg_limit)
        );
    }
    let _ = writeln!(out, "#{} {{main}}", frames.len());

    let mut source = err.source();
    if source.is_some() {
        out.push_str("\nCaused by:\n");
    }
    while let Some(cause) = source {
        let _ = writeln!(out, "    {cause}");
        source = cause.source();
    }

    out.push_str(&"-".repeat(SEPARATOR_WIDTH));
    out.push_str("\n\n");
    out
}

fn format_args_list(args: &[Value], limit: usize) -> String {
    let rendered: Vec<String> = args.iter().map(|arg| format_arg(arg, limit)).collect();
    let joined = rendered.join(", ");
    if joined.contains('\n') {
        format!("\n    {joined}\n")
    } else {
        joined
    }
}

fn format_arg(arg: &Value, limit: usize) -> String {
    let pretty = serde_json::to_string_pretty(arg).unwrap_or_else(|_| arg.to_string());
    let mut text = pretty.replace('\n', "\n    ");
    if limit > 0 && text.len() > limit {
        let mut cut = limit;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str(TRUNCATED);
    }
    text
}

/// Emit a report through `tracing` and append it to `log_file` when set.
/// Append failures are ignored.
pub fn emit(report: &str, log_file: Option<&Path>) {
    tracing::error!(target: "strata::failure", "{report}");
    let Some(path) = log_file else {
        return;
    };
    if let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        let _ = file.write_all(report.as_bytes());
    }
}
