//! The resolved device model.
//!
//! Parameters, constraints and synthesized types live in three arenas owned
//! by [`DeviceModel`] and refer to each other by index. A templated
//! parameter holds the [`ParamId`] of its template and a shared constraint
//! is referenced by [`ConstraintId`], so nothing is ever copied to express
//! "same as".

use crate::constraint::ConstraintNode;
use crate::descriptor::DetailLevel;
use crate::synth::TypeDecl;
use crate::value::Initializer;
use indexmap::IndexMap;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

/// A parameter type code as declared in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Empty,
    String,
    Int32,
    Float32,
    StringArray,
    Int32Array,
    Float32Array,
    Struct,
    StructArray,
    StructVariant,
    StructVariantArray,
}

impl ParamType {
    pub fn from_code(code: &str) -> Option<ParamType> {
        Some(match code {
            "EMPTY" => ParamType::Empty,
            "STRING" => ParamType::String,
            "INT32" => ParamType::Int32,
            "FLOAT32" => ParamType::Float32,
            "STRING_ARRAY" => ParamType::StringArray,
            "INT32_ARRAY" => ParamType::Int32Array,
            "FLOAT32_ARRAY" => ParamType::Float32Array,
            "STRUCT" => ParamType::Struct,
            "STRUCT_ARRAY" => ParamType::StructArray,
            "STRUCT_VARIANT" => ParamType::StructVariant,
            "STRUCT_VARIANT_ARRAY" => ParamType::StructVariantArray,
            _ => return None,
        })
    }

    pub fn code(self) -> &'static str {
        match self {
            ParamType::Empty => "EMPTY",
            ParamType::String => "STRING",
            ParamType::Int32 => "INT32",
            ParamType::Float32 => "FLOAT32",
            ParamType::StringArray => "STRING_ARRAY",
            ParamType::Int32Array => "INT32_ARRAY",
            ParamType::Float32Array => "FLOAT32_ARRAY",
            ParamType::Struct => "STRUCT",
            ParamType::StructArray => "STRUCT_ARRAY",
            ParamType::StructVariant => "STRUCT_VARIANT",
            ParamType::StructVariantArray => "STRUCT_VARIANT_ARRAY",
        }
    }

    pub fn is_array(self) -> bool {
        self != self.element()
    }

    /// The element kind of an array type; other types are their own element.
    pub fn element(self) -> ParamType {
        match self {
            ParamType::StringArray => ParamType::String,
            ParamType::Int32Array => ParamType::Int32,
            ParamType::Float32Array => ParamType::Float32,
            ParamType::StructArray => ParamType::Struct,
            ParamType::StructVariantArray => ParamType::StructVariant,
            other => other,
        }
    }

    pub fn declares_type(self) -> bool {
        matches!(self.element(), ParamType::Struct | ParamType::StructVariant)
    }
}

/// A fully resolved value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Empty,
    String,
    Int32,
    Float32,
    Struct(TypeId),
    Variant(TypeId),
    Array(Box<ValueType>),
}

impl ValueType {
    pub fn element(&self) -> &ValueType {
        match self {
            ValueType::Array(inner) => inner,
            other => other,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ValueType::Array(_))
    }

    /// The declared-type code this resolved type corresponds to.
    pub fn param_type(&self) -> ParamType {
        match self {
            ValueType::Empty => ParamType::Empty,
            ValueType::String => ParamType::String,
            ValueType::Int32 => ParamType::Int32,
            ValueType::Float32 => ParamType::Float32,
            ValueType::Struct(_) => ParamType::Struct,
            ValueType::Variant(_) => ParamType::StructVariant,
            ValueType::Array(inner) => match inner.param_type() {
                ParamType::String => ParamType::StringArray,
                ParamType::Int32 => ParamType::Int32Array,
                ParamType::Float32 => ParamType::Float32Array,
                ParamType::Struct => ParamType::StructArray,
                ParamType::StructVariant => ParamType::StructVariantArray,
                other => other,
            },
        }
    }

    /// The scalar resolution of a declared type code. Struct kinds have no
    /// scalar form and need a synthesized or templated type.
    pub fn scalar(declared: ParamType) -> Option<ValueType> {
        let scalar = |t: ParamType| match t {
            ParamType::Empty => Some(ValueType::Empty),
            ParamType::String => Some(ValueType::String),
            ParamType::Int32 => Some(ValueType::Int32),
            ParamType::Float32 => Some(ValueType::Float32),
            _ => None,
        };
        if declared.is_array() {
            scalar(declared.element()).map(|t| ValueType::Array(Box::new(t)))
        } else {
            scalar(declared)
        }
    }
}

/// Which top-level collection a parameter tree belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Params,
    Commands,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamMeta {
    pub name: Vec<(String, String)>,
    pub oid_aliases: Vec<String>,
    pub widget: Option<String>,
    pub access_scope: Option<String>,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub id: ParamId,
    pub oid: String,
    /// Slash-joined path from the root, e.g. `/location/latitude`.
    pub fqoid: String,
    pub parent: Option<ParamId>,
    pub namespace: Namespace,
    pub is_command: bool,
    pub declared: ParamType,
    pub ty: ValueType,
    /// Struct or variant declaration synthesized for this node.
    pub declares: Option<TypeId>,
    /// `std::vector` alias emitted for a struct or variant array.
    pub alias: Option<TypeId>,
    pub template: Option<ParamId>,
    pub constraint: Option<ConstraintId>,
    pub value: Option<Initializer>,
    pub children: IndexMap<String, ParamId>,
    pub meta: ParamMeta,
}

impl ParamNode {
    /// Identifier stem used for everything generated from this node.
    pub fn ident(&self) -> String {
        let stem = path_ident(&self.fqoid);
        match self.namespace {
            Namespace::Params => stem,
            Namespace::Commands => format!("_cmd{}", stem),
        }
    }
}

/// `/location/latitude` becomes `_location_latitude`.
pub fn path_ident(fqoid: &str) -> String {
    fqoid
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Params indexed by fully-qualified OID for template lookup.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    params: HashMap<String, ParamId>,
}

impl TemplateRegistry {
    pub fn insert(&mut self, fqoid: &str, id: ParamId) {
        self.params.insert(fqoid.to_string(), id);
    }

    /// Look up a template, tolerating a missing leading slash.
    pub fn get(&self, oid: &str) -> Option<ParamId> {
        self.params.get(&normalize_oid(oid)).copied()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

pub(crate) fn normalize_oid(oid: &str) -> String {
    if oid.starts_with('/') {
        oid.to_string()
    } else {
        format!("/{}", oid)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub slot: u32,
    pub detail_level: DetailLevel,
    pub access_scopes: Vec<String>,
    pub default_scope: Option<String>,
    pub multi_set_enabled: bool,
    pub subscriptions: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguagePack {
    pub id: String,
    pub name: String,
    pub words: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuGroup {
    pub oid: String,
    pub name: Vec<(String, String)>,
    pub menus: Vec<Menu>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub oid: String,
    pub name: Vec<(String, String)>,
    pub hidden: bool,
    pub disabled: bool,
    pub param_oids: Vec<String>,
    pub command_oids: Vec<String>,
    pub client_hints: Vec<(String, String)>,
}

/// A fully resolved device, ready for emission. Built once by
/// [`crate::resolve_device`] and never mutated afterwards.
#[derive(Debug)]
pub struct DeviceModel {
    pub namespace: String,
    pub device: DeviceInfo,
    pub language_packs: Vec<LanguagePack>,
    pub shared_constraints: IndexMap<String, ConstraintId>,
    pub params: IndexMap<String, ParamId>,
    pub commands: IndexMap<String, ParamId>,
    pub menu_groups: Vec<MenuGroup>,
    nodes: Vec<ParamNode>,
    constraints: Vec<ConstraintNode>,
    types: Vec<TypeDecl>,
}

impl DeviceModel {
    pub(crate) fn new(namespace: String, device: DeviceInfo) -> Self {
        DeviceModel {
            namespace,
            device,
            language_packs: Vec::new(),
            shared_constraints: IndexMap::new(),
            params: IndexMap::new(),
            commands: IndexMap::new(),
            menu_groups: Vec::new(),
            nodes: Vec::new(),
            constraints: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn param(&self, id: ParamId) -> &ParamNode {
        &self.nodes[id.0]
    }

    pub fn constraint(&self, id: ConstraintId) -> &ConstraintNode {
        &self.constraints[id.0]
    }

    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.0]
    }

    pub fn nodes(&self) -> &[ParamNode] {
        &self.nodes
    }

    pub fn constraints(&self) -> &[ConstraintNode] {
        &self.constraints
    }

    pub fn types(&self) -> &[TypeDecl] {
        &self.types
    }

    pub fn children(&self, id: ParamId) -> impl Iterator<Item = &ParamNode> + '_ {
        self.param(id).children.values().map(move |c| self.param(*c))
    }

    /// Find a parameter by fully-qualified OID such as `/location/latitude`.
    pub fn find_param(&self, fqoid: &str) -> Option<ParamId> {
        Self::walk(&self.nodes, &self.params, fqoid)
    }

    pub fn find_command(&self, fqoid: &str) -> Option<ParamId> {
        Self::walk(&self.nodes, &self.commands, fqoid)
    }

    fn walk(nodes: &[ParamNode], roots: &IndexMap<String, ParamId>, fqoid: &str) -> Option<ParamId> {
        let mut segments = fqoid.trim_start_matches('/').split('/');
        let mut current = *roots.get(segments.next()?)?;
        for seg in segments {
            current = *nodes[current.0].children.get(seg)?;
        }
        Some(current)
    }

    /// Parameter ids of the tree under `root`, parents before children.
    pub fn subtree(&self, root: ParamId) -> Vec<ParamId> {
        let mut out = vec![root];
        let mut i = 0;
        while i < out.len() {
            let node = self.param(out[i]);
            let insert_at = i + 1;
            for (offset, child) in node.children.values().enumerate() {
                out.insert(insert_at + offset, *child);
            }
            i += 1;
        }
        out
    }

    pub(crate) fn push_node(&mut self, node: ParamNode) -> ParamId {
        let id = ParamId(self.nodes.len());
        self.nodes.push(ParamNode { id, ..node });
        id
    }

    pub(crate) fn param_mut(&mut self, id: ParamId) -> &mut ParamNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn push_constraint(&mut self, node: ConstraintNode) -> ConstraintId {
        let id = ConstraintId(self.constraints.len());
        self.constraints.push(node);
        id
    }

    pub(crate) fn push_type(&mut self, decl: TypeDecl) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(decl);
        id
    }

    /// A JSON overview of the resolved model for `catena-codegen inspect`.
    pub fn summary(&self) -> serde_json::Value {
        let tree = |roots: &IndexMap<String, ParamId>| -> Vec<serde_json::Value> {
            roots.values().map(|id| self.param_summary(*id)).collect()
        };
        json!({
            "namespace": self.namespace,
            "slot": self.device.slot,
            "detail_level": self.device.detail_level.as_str(),
            "access_scopes": self.device.access_scopes,
            "default_scope": self.device.default_scope,
            "shared_constraints": self.shared_constraints.keys().collect::<Vec<_>>(),
            "params": tree(&self.params),
            "commands": tree(&self.commands),
            "types": self.types.iter().map(|t| json!({
                "name": t.qualified_name(),
                "kind": t.kind_name(),
            })).collect::<Vec<_>>(),
            "menu_groups": self.menu_groups.iter().map(|g| json!({
                "oid": g.oid,
                "menus": g.menus.iter().map(|m| m.oid.as_str()).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
            "language_packs": self.language_packs.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        })
    }

    fn param_summary(&self, id: ParamId) -> serde_json::Value {
        let node = self.param(id);
        let mut v = json!({
            "oid": node.fqoid,
            "type": node.ty.param_type().code(),
        });
        if let Some(t) = node.template {
            v["template"] = json!(self.param(t).fqoid);
        }
        if let Some(c) = node.constraint {
            let c = self.constraint(c);
            v["constraint"] = json!({"kind": c.kind.code(), "shared": c.is_shared()});
        }
        if node.value.is_some() {
            v["has_value"] = json!(true);
        }
        if !node.children.is_empty() {
            v["params"] = json!(node
                .children
                .values()
                .map(|c| self.param_summary(*c))
                .collect::<Vec<_>>());
        }
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes_round_trip() {
        for code in ["STRING", "INT32_ARRAY", "STRUCT_VARIANT_ARRAY", "EMPTY"] {
            assert_eq!(ParamType::from_code(code).unwrap().code(), code);
        }
        assert_eq!(ParamType::from_code("INT64"), None);
    }

    #[test]
    fn array_element_kinds() {
        assert_eq!(ParamType::StructArray.element(), ParamType::Struct);
        assert!(ParamType::Float32Array.is_array());
        assert!(!ParamType::StructVariant.is_array());
        assert!(ParamType::StructVariantArray.declares_type());
        assert!(!ParamType::Int32Array.declares_type());
    }

    #[test]
    fn scalar_resolution() {
        assert_eq!(
            ValueType::scalar(ParamType::Int32Array),
            Some(ValueType::Array(Box::new(ValueType::Int32)))
        );
        assert_eq!(ValueType::scalar(ParamType::Struct), None);
        assert_eq!(
            ValueType::Array(Box::new(ValueType::Variant(TypeId(0)))).param_type(),
            ParamType::StructVariantArray
        );
    }

    #[test]
    fn idents_from_paths() {
        assert_eq!(path_ident("/location/latitude"), "_location_latitude");
    }

    #[test]
    fn registry_tolerates_missing_slash() {
        let mut reg = TemplateRegistry::default();
        reg.insert("/eq", ParamId(4));
        assert_eq!(reg.get("eq"), Some(ParamId(4)));
        assert_eq!(reg.get("/eq"), Some(ParamId(4)));
        assert_eq!(reg.get("/gain"), None);
    }
}
