//! Typed view of a device-model document as written on disk.
//!
//! These types mirror the JSON/YAML shape one-to-one and carry no
//! resolution logic. OID-keyed objects are read into [`Entries`], which
//! keeps document order and does not collapse repeated keys, so the
//! resolver can both emit in declaration order and reject duplicates.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;

/// An OID-keyed object in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Entries<V>(pub Vec<(String, V)>);

impl<V> Default for Entries<V> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<V> Entries<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first key that appears more than once, if any.
    pub fn duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.keys().find(|k| !seen.insert(*k))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object keyed by oid")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, V>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// How much of the device a client sees by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailLevel {
    #[default]
    Full,
    Subscriptions,
    Minimal,
    Commands,
    None,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Full => "FULL",
            DetailLevel::Subscriptions => "SUBSCRIPTIONS",
            DetailLevel::Minimal => "MINIMAL",
            DetailLevel::Commands => "COMMANDS",
            DetailLevel::None => "NONE",
        }
    }
}

/// Root of a device-model document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeviceDesc {
    #[serde(default)]
    pub slot: u32,
    #[serde(default)]
    pub detail_level: DetailLevel,
    #[serde(default)]
    pub access_scopes: Vec<String>,
    #[serde(default)]
    pub default_scope: Option<String>,
    #[serde(default)]
    pub multi_set_enabled: bool,
    #[serde(default)]
    pub subscriptions: bool,
    #[serde(default)]
    pub constraints: Entries<ConstraintDesc>,
    #[serde(default)]
    pub params: Entries<ParamDesc>,
    #[serde(default)]
    pub commands: Entries<ParamDesc>,
    #[serde(default)]
    pub menu_groups: Entries<MenuGroupDesc>,
    #[serde(default)]
    pub language_packs: Option<LanguagePacksDesc>,
}

/// Localized display strings keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PolyglotText {
    #[serde(default)]
    pub display_strings: Entries<String>,
}

impl PolyglotText {
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.display_strings.0.clone()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParamDesc {
    #[serde(rename = "type", default)]
    pub type_code: Option<String>,
    #[serde(default)]
    pub name: Option<PolyglotText>,
    #[serde(default)]
    pub oid_aliases: Vec<String>,
    #[serde(default)]
    pub widget: Option<String>,
    #[serde(default)]
    pub access_scope: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub template_oid: Option<String>,
    #[serde(default)]
    pub constraint: Option<ConstraintDesc>,
    #[serde(default)]
    pub value: Option<ValueDesc>,
    #[serde(default)]
    pub params: Entries<ParamDesc>,
    #[serde(default)]
    pub import: Option<ImportDesc>,
}

/// Where to find a parameter descriptor that lives in its own file.
///
/// `{"url": "include"}` pulls `param.<oid>.<ext>` from the current import
/// folder; `{"file": "..."}` names the file relative to that folder.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportDesc {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConstraintDesc {
    #[serde(rename = "type", default)]
    pub type_code: Option<String>,
    #[serde(default)]
    pub ref_oid: Option<String>,
    #[serde(default)]
    pub int32_range: Option<RangeDesc<i32>>,
    #[serde(default)]
    pub float_range: Option<RangeDesc<f32>>,
    #[serde(default)]
    pub int32_choice: Option<NamedChoicesDesc<i32>>,
    #[serde(default)]
    pub string_string_choice: Option<NamedChoicesDesc<String>>,
    #[serde(default)]
    pub string_choice: Option<PicklistDesc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangeDesc<T> {
    #[serde(alias = "min")]
    pub min_value: T,
    #[serde(alias = "max")]
    pub max_value: T,
    #[serde(default)]
    pub step: Option<T>,
    #[serde(default)]
    pub display_min: Option<T>,
    #[serde(default)]
    pub display_max: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedChoicesDesc<T> {
    #[serde(default = "Vec::new")]
    pub choices: Vec<NamedChoiceDesc<T>>,
    #[serde(default)]
    pub strict: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedChoiceDesc<T> {
    pub value: T,
    #[serde(default)]
    pub name: PolyglotText,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PicklistDesc {
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub strict: Option<bool>,
}

/// A tagged value as written in the document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDesc {
    StringValue(String),
    Int32Value(i32),
    Float32Value(f32),
    StringArrayValues(StringList),
    Int32ArrayValues(Int32List),
    Float32ArrayValues(Float32List),
    StructValue(StructValueDesc),
    StructArrayValues(StructListDesc),
    StructVariantValue(VariantValueDesc),
    StructVariantArrayValues(VariantListDesc),
}

impl ValueDesc {
    /// The tag this value was written with.
    pub fn tag(&self) -> &'static str {
        match self {
            ValueDesc::StringValue(_) => "string_value",
            ValueDesc::Int32Value(_) => "int32_value",
            ValueDesc::Float32Value(_) => "float32_value",
            ValueDesc::StringArrayValues(_) => "string_array_values",
            ValueDesc::Int32ArrayValues(_) => "int32_array_values",
            ValueDesc::Float32ArrayValues(_) => "float32_array_values",
            ValueDesc::StructValue(_) => "struct_value",
            ValueDesc::StructArrayValues(_) => "struct_array_values",
            ValueDesc::StructVariantValue(_) => "struct_variant_value",
            ValueDesc::StructVariantArrayValues(_) => "struct_variant_array_values",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StringList {
    #[serde(default)]
    pub strings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Int32List {
    #[serde(default)]
    pub ints: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Float32List {
    #[serde(default)]
    pub floats: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructValueDesc {
    #[serde(default)]
    pub fields: Entries<FieldValueDesc>,
}

/// A struct field value, either bare or wrapped as `{"value": ...}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValueDesc {
    Wrapped { value: ValueDesc },
    Bare(ValueDesc),
}

impl FieldValueDesc {
    pub fn value(&self) -> &ValueDesc {
        match self {
            FieldValueDesc::Wrapped { value } | FieldValueDesc::Bare(value) => value,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StructListDesc {
    #[serde(default)]
    pub struct_values: Vec<StructValueDesc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariantValueDesc {
    pub struct_variant_type: String,
    pub value: Box<ValueDesc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VariantListDesc {
    #[serde(default)]
    pub struct_variants: Vec<VariantValueDesc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuGroupDesc {
    #[serde(default)]
    pub name: Option<PolyglotText>,
    #[serde(default)]
    pub menus: Entries<MenuDesc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuDesc {
    #[serde(default)]
    pub name: Option<PolyglotText>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub param_oids: Vec<String>,
    #[serde(default)]
    pub command_oids: Vec<String>,
    #[serde(default)]
    pub client_hints: Entries<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguagePacksDesc {
    #[serde(default)]
    pub packs: Entries<LanguagePackDesc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguagePackDesc {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub words: Entries<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_keep_document_order_and_duplicates() {
        let e: Entries<i32> = serde_json::from_str(r#"{"b": 1, "a": 2, "b": 3}"#).unwrap();
        assert_eq!(e.keys().collect::<Vec<_>>(), vec!["b", "a", "b"]);
        assert_eq!(e.duplicate(), Some("b"));
        assert_eq!(e.get("a"), Some(&2));
    }

    #[test]
    fn struct_fields_accept_bare_and_wrapped_values() {
        let v: ValueDesc = serde_json::from_str(
            r#"{"struct_value": {"fields": {
                "x": {"int32_value": 1},
                "y": {"value": {"float32_value": 2.5}}
            }}}"#,
        )
        .unwrap();
        let ValueDesc::StructValue(sv) = v else {
            panic!("expected struct value");
        };
        assert_eq!(sv.fields.get("x").unwrap().value(), &ValueDesc::Int32Value(1));
        assert_eq!(
            sv.fields.get("y").unwrap().value(),
            &ValueDesc::Float32Value(2.5)
        );
    }

    #[test]
    fn range_accepts_short_min_max_names() {
        let c: ConstraintDesc = serde_json::from_str(
            r#"{"type": "INT_RANGE", "int32_range": {"min": 0, "max": 10}}"#,
        )
        .unwrap();
        let r = c.int32_range.unwrap();
        assert_eq!((r.min_value, r.max_value, r.step), (0, 10, None));
    }

    #[test]
    fn device_defaults() {
        let d: DeviceDesc = serde_json::from_str("{}").unwrap();
        assert_eq!(d.slot, 0);
        assert_eq!(d.detail_level, DetailLevel::Full);
        assert!(d.params.is_empty());
        assert!(d.default_scope.is_none());
    }

    #[test]
    fn detail_level_parses_screaming_case() {
        let d: DeviceDesc = serde_json::from_str(r#"{"detail_level": "SUBSCRIPTIONS"}"#).unwrap();
        assert_eq!(d.detail_level.as_str(), "SUBSCRIPTIONS");
    }
}
