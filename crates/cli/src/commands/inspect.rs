use std::path::Path;

use super::resolve_or_exit;
use crate::OutputFormat;

/// Resolve a device model and print what it resolved to: params with their
/// types, templates and constraints, shared constraints and declared types.
pub(crate) fn cmd_inspect(device_model: &Path, output: OutputFormat, quiet: bool) {
    let model = resolve_or_exit(device_model, output, quiet);
    let pretty = serde_json::to_string_pretty(&model.summary())
        .unwrap_or_else(|e| format!("serialization error: {}", e));
    println!("{}", pretty);
}
