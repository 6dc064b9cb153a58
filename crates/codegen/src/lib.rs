//! catena-codegen: C++ emission for resolved Catena device models.
//!
//! Produces two files per device: a header with the synthesized types and
//! their reflection data, and a source file that instantiates the device,
//! its constraints, parameter descriptors and values.
//!
//! # Public API
//!
//! - [`generate_cpp()`] -- render both streams into memory
//! - [`GeneratedCpp::write_to()`] -- write them into an output directory
//! - [`Language`] -- target languages the driver can ask for

mod body;
mod cpp;
mod header;
mod writer;

use catena_core::DeviceModel;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// C++ namespace of the device runtime SDK.
pub(crate) const RUNTIME: &str = "catena::common";

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("unsupported target language '{0}' (supported: cpp)")]
    UnsupportedLanguage(String),

    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Cpp,
}

impl FromStr for Language {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpp" | "c++" => Ok(Language::Cpp),
            other => Err(CodegenError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Cpp => f.write_str("cpp"),
        }
    }
}

/// Options for C++ generation.
#[derive(Debug, Clone)]
pub struct CppConfig {
    /// File name of the device model, e.g. `device.use_structs.json`. The
    /// generated files are named after it.
    pub source_name: String,
}

impl CppConfig {
    pub fn new(source_name: impl Into<String>) -> Self {
        CppConfig {
            source_name: source_name.into(),
        }
    }

    pub fn header_name(&self) -> String {
        format!("{}.h", self.source_name)
    }

    pub fn body_name(&self) -> String {
        format!("{}.cpp", self.source_name)
    }
}

/// Both generated streams, held in memory.
#[derive(Debug, Clone)]
pub struct GeneratedCpp {
    pub header_name: String,
    pub header: String,
    pub body_name: String,
    pub body: String,
}

impl GeneratedCpp {
    /// Write both files into `dir`, creating it if needed. Returns the
    /// header and body paths.
    pub fn write_to(&self, dir: &Path) -> Result<(PathBuf, PathBuf), CodegenError> {
        let io_err = |path: &Path, source| CodegenError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        let header_path = dir.join(&self.header_name);
        let body_path = dir.join(&self.body_name);
        std::fs::write(&header_path, &self.header).map_err(|e| io_err(&header_path, e))?;
        std::fs::write(&body_path, &self.body).map_err(|e| io_err(&body_path, e))?;
        log::info!(
            "wrote {} and {}",
            header_path.display(),
            body_path.display()
        );
        Ok((header_path, body_path))
    }
}

pub fn generate_cpp(model: &DeviceModel, config: &CppConfig) -> GeneratedCpp {
    log::debug!("generating C++ for namespace '{}'", model.namespace);
    GeneratedCpp {
        header_name: config.header_name(),
        header: header::write_header(model, config),
        body_name: config.body_name(),
        body: body::write_body(model, config),
    }
}
