//! Where device and parameter documents come from.
//!
//! Resolution never touches `std::fs` directly. Everything goes through a
//! [`DocumentSource`], so tests and embedders can feed documents from
//! memory with [`InMemorySource`].

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

pub trait DocumentSource {
    /// Read a whole document as text.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Whether a document exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// A stable identity for `path`, used to detect import cycles.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Reads documents from the local filesystem.
pub struct FileSystemSource;

impl DocumentSource for FileSystemSource {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize()
    }
}

/// Documents held in memory, keyed by lexically normalized path.
#[derive(Default)]
pub struct InMemorySource {
    documents: HashMap<PathBuf, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.documents.insert(normalize(path.as_ref()), text.into());
    }
}

impl DocumentSource for InMemorySource {
    fn read(&self, path: &Path) -> io::Result<String> {
        let key = normalize(path);
        self.documents.get(&key).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such document: {}", key.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.documents.contains_key(&normalize(path))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        let key = normalize(path);
        if self.documents.contains_key(&key) {
            Ok(key)
        } else {
            Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such document: {}", key.display()),
            ))
        }
    }
}

/// Drop `.` segments and fold `..` into their parent without touching disk.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_parent_segments() {
        assert_eq!(
            normalize(Path::new("/models/params/../params/./param.a.json")),
            PathBuf::from("/models/params/param.a.json")
        );
    }

    #[test]
    fn normalize_keeps_root() {
        assert_eq!(normalize(Path::new("/../x.json")), PathBuf::from("/x.json"));
    }

    #[test]
    fn in_memory_reads_by_normalized_path() {
        let src = InMemorySource::new().with_document("/m/params/param.a.json", "{}");
        assert_eq!(src.read(Path::new("/m/params/./param.a.json")).unwrap(), "{}");
        assert!(src.exists(Path::new("/m/x/../params/param.a.json")));
    }

    #[test]
    fn in_memory_missing_document_is_not_found() {
        let src = InMemorySource::new();
        let err = src.read(Path::new("/nope.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(src.canonicalize(Path::new("/nope.json")).is_err());
    }

    #[test]
    fn file_system_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("param.a.json");
        std::fs::write(&path, r#"{"type": "INT32"}"#).unwrap();
        let src = FileSystemSource;
        assert!(src.exists(&path));
        assert_eq!(src.read(&path).unwrap(), r#"{"type": "INT32"}"#);
        assert!(!src.exists(&dir.path().join("param.b.json")));
    }
}
