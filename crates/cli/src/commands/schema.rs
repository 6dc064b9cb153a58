//! JSON Schema validation of device model documents.

use std::path::Path;

use catena_core::loader::parse_value;
use catena_core::Format;

static DEVICE_SCHEMA_STR: &str = include_str!("../../../../schema/device-schema.json");

/// Read a device model (JSON or YAML) as a generic JSON value.
pub(crate) fn read_document(path: &Path) -> Result<serde_json::Value, String> {
    let format = Format::from_path(path).ok_or_else(|| {
        format!(
            "unsupported file type '{}': expected .json, .yaml or .yml",
            path.display()
        )
    })?;
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    parse_value(&text, format).map_err(|e| format!("error parsing '{}': {}", path.display(), e))
}

/// Load the schema to validate against: `override_path` when given,
/// otherwise the one compiled into the binary.
fn load_schema(override_path: Option<&Path>) -> Result<serde_json::Value, String> {
    match override_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("error reading schema '{}': {}", path.display(), e))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("error parsing schema '{}': {}", path.display(), e))
        }
        None => serde_json::from_str(DEVICE_SCHEMA_STR).map_err(|e| {
            format!(
                "internal error: failed to parse embedded device schema: {}",
                e
            )
        }),
    }
}

/// Validate `doc`. `Ok` carries the list of violations (empty when the
/// document is valid); `Err` means the schema itself could not be used.
pub(crate) fn validate_document(
    doc: &serde_json::Value,
    schema_path: Option<&Path>,
) -> Result<Vec<String>, String> {
    let schema = load_schema(schema_path)?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| format!("failed to compile schema: {}", e))?;
    Ok(validator
        .iter_errors(doc)
        .map(|e| format!("{}", e))
        .collect())
}
