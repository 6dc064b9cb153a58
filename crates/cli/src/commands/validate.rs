use std::path::Path;
use std::process;

use super::schema::{read_document, validate_document};
use super::{report_resolve_error, report_schema_errors};
use crate::{report_error, OutputFormat};

/// Schema-check a device model, then resolve it without emitting anything.
pub(crate) fn cmd_validate(
    device_model: &Path,
    schema: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let doc = match read_document(device_model) {
        Ok(doc) => doc,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let errors = match validate_document(&doc, schema) {
        Ok(errors) => errors,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    if !errors.is_empty() {
        report_schema_errors(device_model, &errors, output, quiet);
        process::exit(1);
    }

    let model = match catena_core::resolve_file(device_model) {
        Ok(model) => model,
        Err(e) => {
            report_resolve_error(&e, output, quiet);
            process::exit(1);
        }
    };
    log::info!(
        "{}: {} params, {} shared constraints, {} types",
        device_model.display(),
        model.nodes().len(),
        model.shared_constraints.len(),
        model.types().len()
    );

    if !quiet {
        match output {
            OutputFormat::Text => println!("valid"),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": true,
                    "namespace": model.namespace,
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json).unwrap_or_default()
                );
            }
        }
    }
}
