//! Reading device and parameter documents from a [`DocumentSource`].

use crate::descriptor::{DeviceDesc, ParamDesc};
use crate::error::ResolveError;
use crate::source::{DocumentSource, FileSystemSource};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// On-disk encodings a document may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> Option<Format> {
        match path.extension()?.to_str()? {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
        }
    }
}

/// A device document together with what was learned from its file name.
#[derive(Debug, Clone)]
pub struct DeviceDocument {
    pub path: PathBuf,
    pub namespace: String,
    pub format: Format,
    /// Folder that `{"url": "include"}` imports of top-level params resolve against.
    pub import_root: PathBuf,
    pub desc: DeviceDesc,
}

/// Parse a document straight into its typed form. Neither encoding goes
/// through an intermediate map, so repeated OID keys reach [`Entries`].
///
/// [`Entries`]: crate::descriptor::Entries
pub fn parse_document<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, String> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Parse a document into an untyped JSON value, for schema validation.
pub fn parse_value(text: &str, format: Format) -> Result<serde_json::Value, String> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        Format::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    }
}

/// Derive the generated-code namespace from a `device.<namespace>.<ext>` file name.
pub fn namespace_from_path(path: &Path) -> Result<String, ResolveError> {
    let bad = |reason: String| ResolveError::Document {
        path: path.display().to_string(),
        reason,
    };
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| bad("file name is not valid UTF-8".into()))?;
    let mut parts = stem.split('.');
    if parts.next() != Some("device") {
        return Err(bad(
            "device model files must be named device.<namespace>.json or .yaml".into(),
        ));
    }
    let namespace = match (parts.next(), parts.next()) {
        (Some(ns), None) if !ns.is_empty() => ns,
        _ => {
            return Err(bad(
                "device model files must be named device.<namespace>.json or .yaml".into(),
            ))
        }
    };
    if !is_identifier(namespace) {
        return Err(bad(format!(
            "namespace '{}' is not a valid identifier",
            namespace
        )));
    }
    Ok(namespace.to_string())
}

/// True for a C++-style identifier: a letter or `_` followed by letters,
/// digits or `_`.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn load_device(path: &Path) -> Result<DeviceDocument, ResolveError> {
    load_device_with_source(path, &FileSystemSource)
}

pub fn load_device_with_source(
    path: &Path,
    source: &dyn DocumentSource,
) -> Result<DeviceDocument, ResolveError> {
    let bad = |reason: String| ResolveError::Document {
        path: path.display().to_string(),
        reason,
    };
    let format = Format::from_path(path)
        .ok_or_else(|| bad("expected a .json, .yaml or .yml file".into()))?;
    let namespace = namespace_from_path(path)?;
    let text = source
        .read(path)
        .map_err(|e| bad(format!("cannot read file: {}", e)))?;
    let desc: DeviceDesc = parse_document(&text, format).map_err(bad)?;
    let import_root = path.parent().unwrap_or(Path::new(".")).join("params");
    log::debug!(
        "loaded device model {} (namespace '{}')",
        path.display(),
        namespace
    );
    Ok(DeviceDocument {
        path: path.to_path_buf(),
        namespace,
        format,
        import_root,
        desc,
    })
}

/// Read a standalone parameter descriptor.
pub(crate) fn load_param(
    path: &Path,
    source: &dyn DocumentSource,
) -> Result<ParamDesc, String> {
    let format = Format::from_path(path).unwrap_or(Format::Json);
    let text = source
        .read(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_document(&text, format).map_err(|e| format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    #[test]
    fn namespace_comes_from_file_name() {
        let ns = namespace_from_path(Path::new("models/device.use_structs.json")).unwrap();
        assert_eq!(ns, "use_structs");
        let ns = namespace_from_path(Path::new("device.audio.yaml")).unwrap();
        assert_eq!(ns, "audio");
    }

    #[test]
    fn rejects_badly_named_files() {
        for name in [
            "model.audio.json",
            "device.json",
            "device.a.b.json",
            "device.9lives.json",
        ] {
            let err = namespace_from_path(Path::new(name)).unwrap_err();
            assert!(
                matches!(err, ResolveError::Document { .. }),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn loads_yaml_device() {
        let src = InMemorySource::new().with_document(
            "/m/device.tiny.yaml",
            "slot: 3\nparams:\n  gain:\n    type: INT32\n",
        );
        let doc = load_device_with_source(Path::new("/m/device.tiny.yaml"), &src).unwrap();
        assert_eq!(doc.namespace, "tiny");
        assert_eq!(doc.format, Format::Yaml);
        assert_eq!(doc.desc.slot, 3);
        assert_eq!(doc.import_root, PathBuf::from("/m/params"));
        assert_eq!(doc.desc.params.keys().collect::<Vec<_>>(), vec!["gain"]);
    }

    #[test]
    fn yaml_keeps_repeated_oids() {
        let src = InMemorySource::new().with_document(
            "/m/device.tiny.yaml",
            "params:\n  gain:\n    type: INT32\n  gain:\n    type: STRING\n",
        );
        let doc = load_device_with_source(Path::new("/m/device.tiny.yaml"), &src).unwrap();
        assert_eq!(doc.desc.params.keys().collect::<Vec<_>>(), vec!["gain", "gain"]);
        assert_eq!(doc.desc.params.duplicate(), Some("gain"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let src = InMemorySource::new().with_document("/m/device.x.json", "{ not json");
        let err = load_device_with_source(Path::new("/m/device.x.json"), &src).unwrap_err();
        assert!(err.to_string().starts_with("/m/device.x.json: "));
    }

    #[test]
    fn unsupported_extension() {
        let src = InMemorySource::new();
        let err = load_device_with_source(Path::new("/m/device.x.xml"), &src).unwrap_err();
        assert!(err.to_string().contains(".json, .yaml or .yml"));
    }
}
