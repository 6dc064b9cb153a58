#![allow(clippy::result_large_err)]
//! catena-core: loads Catena device-model documents and resolves them into
//! a typed, cross-referenced [`DeviceModel`].
//!
//! # Public API
//!
//! - [`resolve_file()`] -- load `device.<namespace>.json|yaml` and resolve it
//! - [`resolve_device()`] -- resolve an already parsed [`DeviceDesc`]
//! - [`DeviceModel`] -- the resolved parameter, constraint and type arenas
//! - [`ResolveError`] -- the first fatal problem found
//! - [`DocumentSource`] -- abstraction over where documents are read from
//!
//! Resolution is a single ordered pass. Templates and shared constraints
//! must be declared before the parameters that use them.

pub mod constraint;
pub mod descriptor;
pub mod device;
pub mod error;
pub mod loader;
pub mod model;
pub mod param;
pub mod source;
pub mod synth;
pub mod template;
pub mod value;

pub use constraint::{ConstraintKind, ConstraintNode, ConstraintOwner};
pub use descriptor::{DetailLevel, DeviceDesc, ParamDesc};
pub use device::{resolve_device, resolve_document, resolve_file, resolve_file_with_source};
pub use error::ResolveError;
pub use loader::{load_device, load_device_with_source, DeviceDocument, Format};
pub use model::{
    ConstraintId, DeviceModel, Namespace, ParamId, ParamNode, ParamType, TypeId, ValueType,
};
pub use source::{DocumentSource, FileSystemSource, InMemorySource};
pub use synth::{TypeDecl, TypeDeclKind};
pub use value::Initializer;
