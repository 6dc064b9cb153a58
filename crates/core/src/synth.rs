//! Struct/Variant Synthesizer: derives named type declarations from
//! struct-like parameter trees.

use crate::model::{ParamId, TypeId, ValueType};
use crate::param::ResolveContext;
use crate::value::Initializer;

/// A named type to be declared in generated code.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    /// Enclosing scopes below the device namespace, outermost first.
    pub scope: Vec<String>,
    pub owner: ParamId,
    pub kind: TypeDeclKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDeclKind {
    Struct { fields: Vec<FieldDecl> },
    Variant { alternatives: Vec<AlternativeDecl> },
    /// `std::vector` over a struct or variant element.
    ArrayAlias { element: ValueType },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: ValueType,
    pub default: Option<Initializer>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlternativeDecl {
    pub name: String,
    pub ty: ValueType,
}

impl TypeDecl {
    /// Name qualified by its enclosing scopes, relative to the namespace.
    pub fn qualified_name(&self) -> String {
        let mut parts = self.scope.clone();
        parts.push(self.name.clone());
        parts.join("::")
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeDeclKind::Struct { .. } => "struct",
            TypeDeclKind::Variant { .. } => "variant",
            TypeDeclKind::ArrayAlias { .. } => "array",
        }
    }

    pub fn fields(&self) -> &[FieldDecl] {
        match &self.kind {
            TypeDeclKind::Struct { fields } => fields,
            _ => &[],
        }
    }

    pub fn alternatives(&self) -> &[AlternativeDecl] {
        match &self.kind {
            TypeDeclKind::Variant { alternatives } => alternatives,
            _ => &[],
        }
    }
}

/// `location` becomes `Location`. Only the first letter changes.
pub fn type_name(oid: &str) -> String {
    let mut chars = oid.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Name of the declaration a struct-like param introduces. Arrays declare
/// their element type and alias the container under the plain name.
pub(crate) fn element_name(oid: &str, is_array: bool) -> String {
    if is_array {
        format!("{}_elem", type_name(oid))
    } else {
        type_name(oid)
    }
}

/// Scope that holds the types declared by `owner`'s children.
///
/// Struct children nest inside the struct itself. Variant and command
/// children go in a `_<oid>` holder so an alternative can't collide with a
/// sibling of the variant that has the same name.
pub(crate) fn child_scope(scope: &[String], oid: &str, decl_name: Option<&str>) -> Vec<String> {
    let mut out = scope.to_vec();
    match decl_name {
        Some(name) => out.push(name.to_string()),
        None => out.push(format!("_{}", oid)),
    }
    out
}

/// Declare the struct whose fields are `owner`'s children.
pub(crate) fn declare_struct(
    cx: &mut ResolveContext,
    owner: ParamId,
    scope: Vec<String>,
    name: String,
) -> TypeId {
    let fields = cx
        .model
        .children(owner)
        .map(|c| FieldDecl {
            name: c.oid.clone(),
            ty: c.ty.clone(),
            default: c.value.clone(),
        })
        .collect();
    log::trace!("declare struct {}", name);
    cx.model.push_type(TypeDecl {
        name,
        scope,
        owner,
        kind: TypeDeclKind::Struct { fields },
    })
}

/// Declare the variant whose alternatives are `owner`'s children.
pub(crate) fn declare_variant(
    cx: &mut ResolveContext,
    owner: ParamId,
    scope: Vec<String>,
    name: String,
) -> TypeId {
    let alternatives = cx
        .model
        .children(owner)
        .map(|c| AlternativeDecl {
            name: c.oid.clone(),
            ty: c.ty.clone(),
        })
        .collect();
    log::trace!("declare variant {}", name);
    cx.model.push_type(TypeDecl {
        name,
        scope,
        owner,
        kind: TypeDeclKind::Variant { alternatives },
    })
}

/// Alias `std::vector<element>` under `oid`'s type name.
pub(crate) fn declare_array_alias(
    cx: &mut ResolveContext,
    owner: ParamId,
    scope: Vec<String>,
    oid: &str,
    element: ValueType,
) -> TypeId {
    cx.model.push_type(TypeDecl {
        name: type_name(oid),
        scope,
        owner,
        kind: TypeDeclKind::ArrayAlias { element },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_capitalize_the_first_letter_only() {
        assert_eq!(type_name("location"), "Location");
        assert_eq!(type_name("audio_channel"), "Audio_channel");
        assert_eq!(type_name("eqBand"), "EqBand");
        assert_eq!(type_name(""), "");
    }

    #[test]
    fn arrays_declare_an_element_type() {
        assert_eq!(element_name("bands", true), "Bands_elem");
        assert_eq!(element_name("bands", false), "Bands");
    }

    #[test]
    fn holder_scopes_for_variants_and_commands() {
        let outer = vec!["Widget".to_string()];
        assert_eq!(child_scope(&outer, "shape", None), vec!["Widget", "_shape"]);
        assert_eq!(
            child_scope(&[], "location", Some("Location")),
            vec!["Location"]
        );
    }

    #[test]
    fn qualified_names_join_scopes() {
        let decl = TypeDecl {
            name: "Circle".into(),
            scope: vec!["Widget".into(), "_shape".into()],
            owner: ParamId(0),
            kind: TypeDeclKind::Struct { fields: vec![] },
        };
        assert_eq!(decl.qualified_name(), "Widget::_shape::Circle");
        assert!(decl.alternatives().is_empty());
        assert_eq!(decl.kind_name(), "struct");
    }
}
