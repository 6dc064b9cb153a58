//! C++ spellings of resolved types, literals and initializers.

use catena_core::{DeviceModel, Initializer, ParamNode, TypeId, ValueType};

/// Where a name is being written, relative to the device namespace.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Qualify<'a> {
    /// Inside `namespace <ns> { ... }`.
    Inside,
    /// Anywhere else; names need the namespace prefix.
    Outside(&'a str),
}

pub(crate) fn decl_name(model: &DeviceModel, id: TypeId, q: Qualify) -> String {
    let name = model.type_decl(id).qualified_name();
    match q {
        Qualify::Inside => name,
        Qualify::Outside(ns) => format!("{}::{}", ns, name),
    }
}

pub(crate) fn type_name(model: &DeviceModel, ty: &ValueType, q: Qualify) -> String {
    match ty {
        ValueType::Empty => "catena::common::EmptyValue".to_string(),
        ValueType::String => "std::string".to_string(),
        ValueType::Int32 => "int32_t".to_string(),
        ValueType::Float32 => "float".to_string(),
        ValueType::Struct(t) | ValueType::Variant(t) => decl_name(model, *t, q),
        ValueType::Array(inner) => format!("std::vector<{}>", type_name(model, inner, q)),
    }
}

/// The type a parameter's value is declared with, preferring its array alias.
pub(crate) fn param_type(model: &DeviceModel, node: &ParamNode, q: Qualify) -> String {
    match node.alias {
        Some(alias) => decl_name(model, alias, q),
        None => type_name(model, &node.ty, q),
    }
}

pub(crate) fn initializer(model: &DeviceModel, init: &Initializer, q: Qualify) -> String {
    match init {
        Initializer::String(s) => quote(s),
        Initializer::Int32(i) => i.to_string(),
        Initializer::Float32(f) => float_literal(*f),
        Initializer::List(items) => braced(items.iter().map(|i| initializer(model, i, q))),
        Initializer::Struct(fields) => braced(
            fields
                .iter()
                .map(|(name, v)| format!(".{} = {}", name, initializer(model, v, q))),
        ),
        Initializer::Variant {
            variant,
            index,
            ty,
            value,
            ..
        } => {
            let inner = match value.as_ref() {
                Initializer::List(_) | Initializer::Struct(_) => {
                    format!("{}{}", type_name(model, ty, q), initializer(model, value, q))
                }
                other => initializer(model, other, q),
            };
            format!(
                "{}{{std::in_place_index<{}>, {}}}",
                decl_name(model, *variant, q),
                index,
                inner
            )
        }
    }
}

pub(crate) fn braced(items: impl Iterator<Item = String>) -> String {
    format!("{{{}}}", items.collect::<Vec<_>>().join(", "))
}

pub(crate) fn float_literal(f: f32) -> String {
    format!("{:?}f", f)
}

pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub(crate) fn string_list(items: &[String]) -> String {
    braced(items.iter().map(|s| quote(s)))
}

/// `{{"en", "Gain"}, {"fr", "Gain"}}`
pub(crate) fn polyglot(pairs: &[(String, String)]) -> String {
    braced(
        pairs
            .iter()
            .map(|(k, v)| format!("{{{}, {}}}", quote(k), quote(v))),
    )
}

pub(crate) fn bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

pub(crate) fn optional_string(s: &Option<String>) -> String {
    match s {
        Some(s) => quote(s),
        None => "\"\"".to_string(),
    }
}
