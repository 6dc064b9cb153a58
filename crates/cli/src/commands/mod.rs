pub(crate) mod generate;
pub(crate) mod inspect;
pub(crate) mod schema;
pub(crate) mod validate;

use std::path::Path;
use std::process;

use catena_core::{DeviceModel, ResolveError};

use crate::OutputFormat;

/// Print a resolution error in the requested format.
pub(crate) fn report_resolve_error(e: &ResolveError, output: OutputFormat, quiet: bool) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::to_string_pretty(&e.to_json_value())
                .unwrap_or_else(|_| format!("{{\"error\": \"{:?}\"}}", e));
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => {
            if !quiet {
                eprintln!("error: {}", e);
            }
        }
    }
}

/// Resolve the device model at `path`, exiting with status 1 on failure.
pub(crate) fn resolve_or_exit(path: &Path, output: OutputFormat, quiet: bool) -> DeviceModel {
    match catena_core::resolve_file(path) {
        Ok(model) => model,
        Err(e) => {
            report_resolve_error(&e, output, quiet);
            process::exit(1);
        }
    }
}

/// Print schema violations, in text or as a JSON object on stderr.
pub(crate) fn report_schema_errors(
    path: &Path,
    errors: &[String],
    output: OutputFormat,
    quiet: bool,
) {
    match output {
        OutputFormat::Text => {
            if !quiet {
                eprintln!("invalid device model '{}'", path.display());
                for err in errors {
                    eprintln!("  - {}", err);
                }
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "valid": false,
                "file": path.display().to_string(),
                "errors": errors,
            });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&json).unwrap_or_default()
            );
        }
    }
}
