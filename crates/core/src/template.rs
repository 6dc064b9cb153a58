//! Template Binder: resolves `template_oid` references against parameters
//! that have already been resolved.
//!
//! A template is any earlier parameter, looked up by fully-qualified OID.
//! Lookup happens during the single ordered pass, so only params declared
//! (and finished) before the referencing one are visible.

use crate::error::ResolveError;
use crate::model::{ConstraintId, ParamId, ParamNode, ParamType, ValueType};
use crate::param::ResolveContext;
use crate::value::Initializer;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TemplateBinding {
    pub template: ParamId,
    pub ty: ValueType,
    /// The param is an array whose elements have the template's type.
    pub over_elements: bool,
    pub constraint: Option<ConstraintId>,
    pub initializer: Option<Initializer>,
}

/// The type a param declared as `declared` gets when templated on a param
/// resolved to `template`, if the two are compatible.
pub fn compatible_type(declared: ParamType, template: &ValueType) -> Option<(ValueType, bool)> {
    let template_kind = template.param_type();
    if declared == template_kind {
        return Some((template.clone(), false));
    }
    if declared.is_array() && !template.is_array() && declared.element() == template_kind {
        return Some((ValueType::Array(Box::new(template.clone())), true));
    }
    None
}

pub(crate) fn bind(
    cx: &ResolveContext,
    fqoid: &str,
    declared: ParamType,
    template_oid: &str,
) -> Result<TemplateBinding, ResolveError> {
    let template_id = cx
        .registry
        .get(template_oid)
        .ok_or_else(|| ResolveError::MissingTemplate {
            oid: fqoid.to_string(),
            template: template_oid.to_string(),
        })?;
    let template = cx.model.param(template_id);
    let (ty, over_elements) = compatible_type(declared, &template.ty).ok_or_else(|| {
        ResolveError::TemplateTypeMismatch {
            oid: fqoid.to_string(),
            declared: declared.code().to_string(),
            template: template.fqoid.clone(),
            template_type: template.ty.param_type().code().to_string(),
        }
    })?;
    log::debug!("{} uses template {}", fqoid, template.fqoid);
    Ok(TemplateBinding {
        template: template_id,
        ty,
        over_elements,
        constraint: template.constraint,
        initializer: if over_elements {
            None
        } else {
            template.value.clone()
        },
    })
}

/// Copy `template`'s child tree under `target`, registering each copy.
///
/// Copies share the template's types and constraints; only their position
/// in the tree is new.
pub(crate) fn instantiate_children(
    cx: &mut ResolveContext,
    target: ParamId,
    template: ParamId,
) -> Result<(), ResolveError> {
    let source_children: Vec<ParamId> = cx.model.param(template).children.values().copied().collect();
    let mut children = IndexMap::new();
    for source in source_children {
        let copy = instantiate(cx, target, source)?;
        let oid = cx.model.param(copy).oid.clone();
        children.insert(oid, copy);
    }
    cx.model.param_mut(target).children = children;
    Ok(())
}

fn instantiate(
    cx: &mut ResolveContext,
    parent: ParamId,
    source: ParamId,
) -> Result<ParamId, ResolveError> {
    let parent_node = cx.model.param(parent);
    let src = cx.model.param(source);
    let node = ParamNode {
        fqoid: format!("{}/{}", parent_node.fqoid, src.oid),
        parent: Some(parent),
        namespace: parent_node.namespace,
        is_command: false,
        declares: None,
        children: IndexMap::new(),
        ..src.clone()
    };
    let copy = cx.model.push_node(node);
    cx.claim_ident(copy)?;
    instantiate_children(cx, copy, source)?;
    cx.register(copy);
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeId;

    #[test]
    fn same_kind_is_compatible() {
        let t = ValueType::Struct(TypeId(2));
        assert_eq!(
            compatible_type(ParamType::Struct, &t),
            Some((t.clone(), false))
        );
    }

    #[test]
    fn array_over_element_template() {
        let t = ValueType::Struct(TypeId(2));
        assert_eq!(
            compatible_type(ParamType::StructArray, &t),
            Some((ValueType::Array(Box::new(t)), true))
        );
        assert_eq!(
            compatible_type(ParamType::Int32Array, &ValueType::Int32),
            Some((ValueType::Array(Box::new(ValueType::Int32)), true))
        );
    }

    #[test]
    fn array_template_for_array_param_is_same_type() {
        let t = ValueType::Array(Box::new(ValueType::Variant(TypeId(1))));
        assert_eq!(
            compatible_type(ParamType::StructVariantArray, &t),
            Some((t.clone(), false))
        );
    }

    #[test]
    fn mismatched_kinds_are_rejected() {
        assert_eq!(compatible_type(ParamType::Int32, &ValueType::Float32), None);
        assert_eq!(
            compatible_type(ParamType::Struct, &ValueType::Variant(TypeId(0))),
            None
        );
        assert_eq!(
            compatible_type(
                ParamType::Int32,
                &ValueType::Array(Box::new(ValueType::Int32))
            ),
            None
        );
    }
}
