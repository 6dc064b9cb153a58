//! Optional `catena-codegen.toml` holding defaults for `generate`.
//!
//! # Example
//!
//! ```toml
//! [generate]
//! out = "build/generated"
//! language = "cpp"
//! namespace = "my_device"
//! schema = "schema/device-schema.json"
//! skip_schema = false
//! ```
//!
//! Command-line flags always win over values from the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Name looked up in the working directory when `--config` is not given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "catena-codegen.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct CodegenConfig {
    #[serde(default)]
    pub generate: GenerateSettings,
}

/// `[generate]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GenerateSettings {
    pub out: Option<PathBuf>,
    pub language: Option<String>,
    pub namespace: Option<String>,
    pub schema: Option<PathBuf>,
    #[serde(default)]
    pub skip_schema: bool,
}

/// Read and parse a config file. Returns a human-readable error string on
/// failure.
pub(crate) fn read_config(path: &Path) -> Result<CodegenConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

/// Resolve which config applies: an explicit `--config` must exist, the
/// default file is used only when present.
pub(crate) fn load_config(explicit: Option<&Path>) -> Result<CodegenConfig, String> {
    match explicit {
        Some(path) => read_config(path),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.is_file() {
                log::debug!("using {}", DEFAULT_CONFIG_FILE);
                read_config(default)
            } else {
                Ok(CodegenConfig::default())
            }
        }
    }
}
