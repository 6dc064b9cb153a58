//! Tagged Value Resolver: checks a document value against a resolved type
//! and turns it into an [`Initializer`].

use crate::descriptor::{StructValueDesc, ValueDesc, VariantValueDesc};
use crate::error::ResolveError;
use crate::model::{DeviceModel, TypeId, ValueType};

/// A language-neutral initializer expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    String(String),
    Int32(i32),
    Float32(f32),
    List(Vec<Initializer>),
    /// Fields that were set, in declaration order. Unset fields keep the
    /// type's defaults.
    Struct(Vec<(String, Initializer)>),
    /// One alternative of a variant, tagged with its position and type.
    Variant {
        variant: TypeId,
        index: usize,
        alternative: String,
        ty: ValueType,
        value: Box<Initializer>,
    },
}

/// The value tag a parameter of type `ty` must be written with.
pub fn expected_tag(ty: &ValueType) -> &'static str {
    match ty {
        ValueType::Empty => "no value",
        ValueType::String => "string_value",
        ValueType::Int32 => "int32_value",
        ValueType::Float32 => "float32_value",
        ValueType::Struct(_) => "struct_value",
        ValueType::Variant(_) => "struct_variant_value",
        ValueType::Array(inner) => match inner.as_ref() {
            ValueType::String => "string_array_values",
            ValueType::Int32 => "int32_array_values",
            ValueType::Float32 => "float32_array_values",
            ValueType::Struct(_) => "struct_array_values",
            ValueType::Variant(_) => "struct_variant_array_values",
            _ => "no value",
        },
    }
}

pub fn resolve_value(
    model: &DeviceModel,
    oid: &str,
    ty: &ValueType,
    value: &ValueDesc,
) -> Result<Initializer, ResolveError> {
    use ValueDesc as V;
    match (ty, value) {
        (ValueType::String, V::StringValue(s)) => Ok(Initializer::String(s.clone())),
        (ValueType::Int32, V::Int32Value(i)) => Ok(Initializer::Int32(*i)),
        (ValueType::Float32, V::Float32Value(f)) => Ok(Initializer::Float32(*f)),
        (ValueType::Struct(t), V::StructValue(sv)) => resolve_struct(model, oid, *t, sv),
        (ValueType::Variant(t), V::StructVariantValue(vv)) => resolve_variant(model, oid, *t, vv),
        (ValueType::Array(elem), _) => match (elem.as_ref(), value) {
            (ValueType::String, V::StringArrayValues(l)) => Ok(Initializer::List(
                l.strings.iter().cloned().map(Initializer::String).collect(),
            )),
            (ValueType::Int32, V::Int32ArrayValues(l)) => Ok(Initializer::List(
                l.ints.iter().copied().map(Initializer::Int32).collect(),
            )),
            (ValueType::Float32, V::Float32ArrayValues(l)) => Ok(Initializer::List(
                l.floats.iter().copied().map(Initializer::Float32).collect(),
            )),
            (ValueType::Struct(t), V::StructArrayValues(l)) => l
                .struct_values
                .iter()
                .enumerate()
                .map(|(i, sv)| resolve_struct(model, &format!("{}[{}]", oid, i), *t, sv))
                .collect::<Result<Vec<_>, _>>()
                .map(Initializer::List),
            (ValueType::Variant(t), V::StructVariantArrayValues(l)) => l
                .struct_variants
                .iter()
                .enumerate()
                .map(|(i, vv)| resolve_variant(model, &format!("{}[{}]", oid, i), *t, vv))
                .collect::<Result<Vec<_>, _>>()
                .map(Initializer::List),
            _ => Err(mismatch(oid, ty, value)),
        },
        _ => Err(mismatch(oid, ty, value)),
    }
}

fn mismatch(oid: &str, ty: &ValueType, value: &ValueDesc) -> ResolveError {
    ResolveError::ValueTypeMismatch {
        oid: oid.to_string(),
        expected: expected_tag(ty).to_string(),
        found: value.tag().to_string(),
    }
}

fn resolve_struct(
    model: &DeviceModel,
    oid: &str,
    ty: TypeId,
    sv: &StructValueDesc,
) -> Result<Initializer, ResolveError> {
    let fields = model.type_decl(ty).fields();
    if let Some(dup) = sv.fields.duplicate() {
        return Err(ResolveError::DuplicateOid {
            scope: format!("value of {}", oid),
            oid: dup.to_string(),
        });
    }
    if let Some(unknown) = sv
        .fields
        .keys()
        .find(|name| !fields.iter().any(|f| f.name == *name))
    {
        return Err(ResolveError::UnknownField {
            oid: oid.to_string(),
            field: unknown.to_string(),
        });
    }
    let mut set = Vec::new();
    for field in fields {
        if let Some(v) = sv.fields.get(&field.name) {
            let path = format!("{}/{}", oid, field.name);
            set.push((field.name.clone(), resolve_value(model, &path, &field.ty, v.value())?));
        }
    }
    Ok(Initializer::Struct(set))
}

fn resolve_variant(
    model: &DeviceModel,
    oid: &str,
    ty: TypeId,
    vv: &VariantValueDesc,
) -> Result<Initializer, ResolveError> {
    let alternatives = model.type_decl(ty).alternatives();
    let (index, alt) = alternatives
        .iter()
        .enumerate()
        .find(|(_, a)| a.name == vv.struct_variant_type)
        .ok_or_else(|| ResolveError::UnknownAlternative {
            oid: oid.to_string(),
            alternative: vv.struct_variant_type.clone(),
            available: alternatives
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;
    let path = format!("{}/{}", oid, alt.name);
    let inner = resolve_value(model, &path, &alt.ty, &vv.value)?;
    Ok(Initializer::Variant {
        variant: ty,
        index,
        alternative: alt.name.clone(),
        ty: alt.ty.clone(),
        value: Box::new(inner),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceInfo;

    fn empty_model() -> DeviceModel {
        DeviceModel::new(
            "test".into(),
            DeviceInfo {
                slot: 0,
                detail_level: Default::default(),
                access_scopes: vec![],
                default_scope: None,
                multi_set_enabled: false,
                subscriptions: false,
            },
        )
    }

    fn value(json: &str) -> ValueDesc {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn scalars_resolve_to_literals() {
        let m = empty_model();
        assert_eq!(
            resolve_value(&m, "/gain", &ValueType::Int32, &value(r#"{"int32_value": 7}"#)),
            Ok(Initializer::Int32(7))
        );
        assert_eq!(
            resolve_value(&m, "/name", &ValueType::String, &value(r#"{"string_value": "hi"}"#)),
            Ok(Initializer::String("hi".into()))
        );
        assert_eq!(
            resolve_value(&m, "/level", &ValueType::Float32, &value(r#"{"float32_value": 2}"#)),
            Ok(Initializer::Float32(2.0))
        );
    }

    #[test]
    fn scalar_arrays_resolve_to_lists() {
        let m = empty_model();
        let ty = ValueType::Array(Box::new(ValueType::Int32));
        assert_eq!(
            resolve_value(&m, "/taps", &ty, &value(r#"{"int32_array_values": {"ints": [1, 2]}}"#)),
            Ok(Initializer::List(vec![Initializer::Int32(1), Initializer::Int32(2)]))
        );
    }

    #[test]
    fn tag_mismatch_names_both_tags() {
        let m = empty_model();
        let err = resolve_value(&m, "/gain", &ValueType::Int32, &value(r#"{"string_value": "x"}"#))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::ValueTypeMismatch {
                oid: "/gain".into(),
                expected: "int32_value".into(),
                found: "string_value".into(),
            }
        );
    }

    #[test]
    fn array_with_scalar_tag_is_a_mismatch() {
        let m = empty_model();
        let ty = ValueType::Array(Box::new(ValueType::String));
        let err = resolve_value(&m, "/names", &ty, &value(r#"{"string_value": "x"}"#)).unwrap_err();
        assert!(err.to_string().contains("expected string_array_values"));
    }
}
