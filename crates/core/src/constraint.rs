//! Constraint Resolver: turns constraint descriptors into typed constraint
//! nodes and registers them in the model.
//!
//! Shared constraints are registered once, by OID, before any parameter is
//! resolved. A parameter either references one of them through `ref_oid`
//! or carries an inline definition that it owns.

use crate::descriptor::{ConstraintDesc, Entries, NamedChoicesDesc, PicklistDesc, RangeDesc};
use crate::error::ResolveError;
use crate::model::{path_ident, ConstraintId, ParamId, ParamType};
use crate::param::ResolveContext;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintNode {
    /// Shared constraints keep their OID; inline ones take the owner's fqoid.
    pub oid: String,
    /// Identifier stem for generated code.
    pub ident: String,
    pub owner: ConstraintOwner,
    pub kind: ConstraintKind,
}

impl ConstraintNode {
    pub fn is_shared(&self) -> bool {
        self.owner == ConstraintOwner::Device
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOwner {
    Device,
    Param(ParamId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintKind {
    IntRange(Range<i32>),
    FloatRange(Range<f32>),
    IntChoice(NamedChoices<i32>),
    StringChoice(NamedChoices<String>),
    Picklist(Picklist),
}

impl ConstraintKind {
    /// Constraint type code, as written in the document.
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintKind::IntRange(_) => "INT_RANGE",
            ConstraintKind::FloatRange(_) => "FLOAT_RANGE",
            ConstraintKind::IntChoice(_) => "INT_CHOICE",
            ConstraintKind::StringChoice(_) => "STRING_STRING_CHOICE",
            ConstraintKind::Picklist(_) => "STRING_CHOICE",
        }
    }

    /// The scalar type a constrained parameter (or its elements) must have.
    pub fn scalar(&self) -> ParamType {
        match self {
            ConstraintKind::IntRange(_) | ConstraintKind::IntChoice(_) => ParamType::Int32,
            ConstraintKind::FloatRange(_) => ParamType::Float32,
            ConstraintKind::StringChoice(_) | ConstraintKind::Picklist(_) => ParamType::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Range<T> {
    pub min: T,
    pub max: T,
    pub step: T,
    pub display_min: T,
    pub display_max: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedChoices<T> {
    pub choices: Vec<NamedChoice<T>>,
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedChoice<T> {
    pub value: T,
    pub name: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Picklist {
    pub choices: Vec<String>,
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstraintCode {
    IntRange,
    FloatRange,
    IntChoice,
    StringStringChoice,
    StringChoice,
    AlarmTable,
}

impl ConstraintCode {
    fn parse(code: &str) -> Option<ConstraintCode> {
        Some(match code {
            "INT_RANGE" => ConstraintCode::IntRange,
            "FLOAT_RANGE" => ConstraintCode::FloatRange,
            "INT_CHOICE" => ConstraintCode::IntChoice,
            "STRING_STRING_CHOICE" => ConstraintCode::StringStringChoice,
            "STRING_CHOICE" => ConstraintCode::StringChoice,
            "ALARM_TABLE" => ConstraintCode::AlarmTable,
            _ => return None,
        })
    }
}

trait Step: Copy + PartialOrd + Display {
    const ZERO: Self;
    const ONE: Self;
}

impl Step for i32 {
    const ZERO: Self = 0;
    const ONE: Self = 1;
}

impl Step for f32 {
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;
}

/// Map a constraint descriptor onto its typed kind. `oid` only labels errors.
pub fn classify(oid: &str, desc: &ConstraintDesc) -> Result<ConstraintKind, ResolveError> {
    let code = desc.type_code.as_deref().unwrap_or("");
    let parsed = ConstraintCode::parse(code).ok_or_else(|| ResolveError::UnknownConstraintType {
        oid: oid.to_string(),
        code: code.to_string(),
    })?;
    let missing = || ResolveError::InvalidConstraint {
        oid: oid.to_string(),
        code: code.to_string(),
        reason: "missing constraint payload".into(),
    };
    match parsed {
        ConstraintCode::IntRange => {
            let r = desc.int32_range.as_ref().ok_or_else(missing)?;
            range(oid, code, r).map(ConstraintKind::IntRange)
        }
        ConstraintCode::FloatRange => {
            let r = desc.float_range.as_ref().ok_or_else(missing)?;
            range(oid, code, r).map(ConstraintKind::FloatRange)
        }
        ConstraintCode::IntChoice => {
            let c = desc.int32_choice.as_ref().ok_or_else(missing)?;
            named_choices(oid, code, c).map(ConstraintKind::IntChoice)
        }
        ConstraintCode::StringStringChoice => {
            let c = desc.string_string_choice.as_ref().ok_or_else(missing)?;
            named_choices(oid, code, c).map(ConstraintKind::StringChoice)
        }
        ConstraintCode::StringChoice => {
            let c = desc.string_choice.as_ref().ok_or_else(missing)?;
            picklist(oid, code, c).map(ConstraintKind::Picklist)
        }
        ConstraintCode::AlarmTable => Err(ResolveError::UnsupportedConstraint {
            oid: oid.to_string(),
            code: code.to_string(),
        }),
    }
}

fn invalid(oid: &str, code: &str, reason: String) -> ResolveError {
    ResolveError::InvalidConstraint {
        oid: oid.to_string(),
        code: code.to_string(),
        reason,
    }
}

fn range<T: Step>(oid: &str, code: &str, desc: &RangeDesc<T>) -> Result<Range<T>, ResolveError> {
    if desc.min_value > desc.max_value {
        return Err(invalid(
            oid,
            code,
            format!("min {} exceeds max {}", desc.min_value, desc.max_value),
        ));
    }
    let step = desc.step.unwrap_or(T::ONE);
    // NaN compares as None
    if step.partial_cmp(&T::ZERO) != Some(Ordering::Greater) {
        return Err(invalid(oid, code, format!("step {} must be positive", step)));
    }
    let display_min = desc.display_min.unwrap_or(desc.min_value);
    let display_max = desc.display_max.unwrap_or(desc.max_value);
    if display_min > display_max {
        return Err(invalid(
            oid,
            code,
            format!("display min {} exceeds display max {}", display_min, display_max),
        ));
    }
    Ok(Range {
        min: desc.min_value,
        max: desc.max_value,
        step,
        display_min,
        display_max,
    })
}

fn named_choices<T: Clone + Eq + Hash + Display>(
    oid: &str,
    code: &str,
    desc: &NamedChoicesDesc<T>,
) -> Result<NamedChoices<T>, ResolveError> {
    let values: Vec<&T> = desc.choices.iter().map(|c| &c.value).collect();
    check_choices(oid, code, &values)?;
    Ok(NamedChoices {
        choices: desc
            .choices
            .iter()
            .map(|c| NamedChoice {
                value: c.value.clone(),
                name: c.name.pairs(),
            })
            .collect(),
        strict: desc.strict.unwrap_or(false),
    })
}

fn picklist(oid: &str, code: &str, desc: &PicklistDesc) -> Result<Picklist, ResolveError> {
    let values: Vec<&String> = desc.choices.iter().collect();
    check_choices(oid, code, &values)?;
    Ok(Picklist {
        choices: desc.choices.clone(),
        strict: desc.strict.unwrap_or(false),
    })
}

fn check_choices<T: Eq + Hash + Display>(
    oid: &str,
    code: &str,
    values: &[&T],
) -> Result<(), ResolveError> {
    if values.is_empty() {
        return Err(invalid(oid, code, "no choices given".into()));
    }
    let mut seen = HashSet::new();
    for v in values {
        if !seen.insert(*v) {
            return Err(invalid(oid, code, format!("choice '{}' appears twice", v)));
        }
    }
    Ok(())
}

/// Register every entry of the device's `constraints` block.
pub(crate) fn resolve_shared(
    cx: &mut ResolveContext,
    constraints: &Entries<ConstraintDesc>,
) -> Result<(), ResolveError> {
    if let Some(dup) = constraints.duplicate() {
        return Err(ResolveError::DuplicateOid {
            scope: "constraints".into(),
            oid: dup.to_string(),
        });
    }
    for (oid, desc) in constraints.iter() {
        if desc.ref_oid.is_some() {
            return Err(invalid(
                oid,
                desc.type_code.as_deref().unwrap_or(""),
                "a shared constraint cannot reference another constraint".into(),
            ));
        }
        let kind = classify(oid, desc)?;
        log::debug!("shared constraint '{}' ({})", oid, kind.code());
        let id = cx.model.push_constraint(ConstraintNode {
            oid: oid.to_string(),
            ident: format!("_{}", path_ident(oid)),
            owner: ConstraintOwner::Device,
            kind,
        });
        cx.model.shared_constraints.insert(oid.to_string(), id);
    }
    Ok(())
}

/// Resolve the constraint declared on `owner`, registering an inline
/// definition at most once per node.
pub(crate) fn resolve_param_constraint(
    cx: &mut ResolveContext,
    owner: ParamId,
    desc: &ConstraintDesc,
) -> Result<ConstraintId, ResolveError> {
    if let Some(existing) = cx.constrained.get(&owner) {
        return Ok(*existing);
    }
    let node = cx.model.param(owner);
    let fqoid = node.fqoid.clone();
    let id = match &desc.ref_oid {
        Some(reference) => {
            if desc.type_code.is_some() {
                return Err(invalid(
                    &fqoid,
                    desc.type_code.as_deref().unwrap_or(""),
                    "ref_oid cannot be combined with an inline definition".into(),
                ));
            }
            *cx.model.shared_constraints.get(reference.as_str()).ok_or_else(|| {
                ResolveError::MissingSharedConstraint {
                    oid: fqoid.clone(),
                    constraint: reference.clone(),
                }
            })?
        }
        None => {
            let kind = classify(&fqoid, desc)?;
            let ident = node.ident();
            cx.model.push_constraint(ConstraintNode {
                oid: fqoid,
                ident,
                owner: ConstraintOwner::Param(owner),
                kind,
            })
        }
    };
    cx.constrained.insert(owner, id);
    Ok(id)
}
