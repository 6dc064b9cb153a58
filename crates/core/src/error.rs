//! Resolution errors.
//!
//! Resolution is all-or-nothing: the first error aborts the pass and no
//! partial model escapes. Every variant names the fully-qualified OID of
//! the node it concerns so the message can point back into the document.

use serde_json::json;

/// A fatal problem found while loading or resolving a device model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("{path}: {reason}")]
    Document { path: String, reason: String },

    #[error("{oid}: unknown parameter type '{code}'")]
    UnknownParamType { oid: String, code: String },

    #[error("{oid}: unknown constraint type '{code}'")]
    UnknownConstraintType { oid: String, code: String },

    #[error("{oid}: {code} constraints are not supported")]
    UnsupportedConstraint { oid: String, code: String },

    #[error("{oid}: invalid {code} constraint: {reason}")]
    InvalidConstraint {
        oid: String,
        code: String,
        reason: String,
    },

    #[error("{oid}: {code} constraint cannot apply to a {param_type} parameter")]
    ConstraintTypeMismatch {
        oid: String,
        code: String,
        param_type: String,
    },

    #[error("{oid}: missing shared constraint '{constraint}'")]
    MissingSharedConstraint { oid: String, constraint: String },

    #[error("{oid}: missing template '{template}' (templates must be declared before use)")]
    MissingTemplate { oid: String, template: String },

    #[error(
        "{oid}: declared type {declared} is not compatible with template '{template}' of type {template_type}"
    )]
    TemplateTypeMismatch {
        oid: String,
        declared: String,
        template: String,
        template_type: String,
    },

    #[error("{oid}: {reason}")]
    InvalidTemplate { oid: String, reason: String },

    #[error("{oid}: expected {expected} but the value is {found}")]
    ValueTypeMismatch {
        oid: String,
        expected: String,
        found: String,
    },

    #[error("{oid}: struct value sets undeclared field '{field}'")]
    UnknownField { oid: String, field: String },

    #[error("{oid}: '{alternative}' is not an alternative of this variant (expected one of: {available})")]
    UnknownAlternative {
        oid: String,
        alternative: String,
        available: String,
    },

    #[error("{oid}: a {param_type} parameter cannot declare params")]
    UnexpectedParams { oid: String, param_type: String },

    #[error("{oid}: a struct variant needs at least one alternative")]
    EmptyVariant { oid: String },

    #[error("duplicate oid '{oid}' in {scope}")]
    DuplicateOid { scope: String, oid: String },

    #[error("{oid}: cannot import '{import}': {reason}")]
    Import {
        oid: String,
        import: String,
        reason: String,
    },

    #[error("{oid}: invalid command: {reason}")]
    InvalidCommand { oid: String, reason: String },

    #[error("{oid}: generated name '{ident}' is already taken by '{other}'")]
    NameClash {
        oid: String,
        ident: String,
        other: String,
    },

    #[error("menu '{menu}' references unknown {kind} '{target}'")]
    MissingMenuTarget {
        menu: String,
        kind: String,
        target: String,
    },

    #[error("device: {reason}")]
    InvalidDevice { reason: String },
}

impl ResolveError {
    /// Short machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Document { .. } => "document",
            ResolveError::UnknownParamType { .. } => "unknown_param_type",
            ResolveError::UnknownConstraintType { .. } => "unknown_constraint_type",
            ResolveError::UnsupportedConstraint { .. } => "unsupported_constraint",
            ResolveError::InvalidConstraint { .. } => "invalid_constraint",
            ResolveError::ConstraintTypeMismatch { .. } => "constraint_type_mismatch",
            ResolveError::MissingSharedConstraint { .. } => "missing_shared_constraint",
            ResolveError::MissingTemplate { .. } => "missing_template",
            ResolveError::TemplateTypeMismatch { .. } => "template_type_mismatch",
            ResolveError::InvalidTemplate { .. } => "invalid_template",
            ResolveError::ValueTypeMismatch { .. } => "value_type_mismatch",
            ResolveError::UnknownField { .. } => "unknown_field",
            ResolveError::UnknownAlternative { .. } => "unknown_alternative",
            ResolveError::UnexpectedParams { .. } => "unexpected_params",
            ResolveError::EmptyVariant { .. } => "empty_variant",
            ResolveError::DuplicateOid { .. } => "duplicate_oid",
            ResolveError::Import { .. } => "import",
            ResolveError::InvalidCommand { .. } => "invalid_command",
            ResolveError::NameClash { .. } => "name_clash",
            ResolveError::MissingMenuTarget { .. } => "missing_menu_target",
            ResolveError::InvalidDevice { .. } => "invalid_device",
        }
    }

    /// The OID (or scope) the error is attached to, when there is one.
    pub fn oid(&self) -> Option<&str> {
        match self {
            ResolveError::UnknownParamType { oid, .. }
            | ResolveError::UnknownConstraintType { oid, .. }
            | ResolveError::UnsupportedConstraint { oid, .. }
            | ResolveError::InvalidConstraint { oid, .. }
            | ResolveError::ConstraintTypeMismatch { oid, .. }
            | ResolveError::MissingSharedConstraint { oid, .. }
            | ResolveError::MissingTemplate { oid, .. }
            | ResolveError::TemplateTypeMismatch { oid, .. }
            | ResolveError::InvalidTemplate { oid, .. }
            | ResolveError::ValueTypeMismatch { oid, .. }
            | ResolveError::UnknownField { oid, .. }
            | ResolveError::UnknownAlternative { oid, .. }
            | ResolveError::UnexpectedParams { oid, .. }
            | ResolveError::EmptyVariant { oid }
            | ResolveError::DuplicateOid { oid, .. }
            | ResolveError::Import { oid, .. }
            | ResolveError::InvalidCommand { oid, .. }
            | ResolveError::NameClash { oid, .. } => Some(oid.as_str()),
            ResolveError::MissingMenuTarget { menu, .. } => Some(menu.as_str()),
            ResolveError::Document { .. } | ResolveError::InvalidDevice { .. } => None,
        }
    }

    /// Serialize for `--output json` reporting.
    pub fn to_json_value(&self) -> serde_json::Value {
        json!({
            "kind": self.kind(),
            "oid": self.oid(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_offending_oid() {
        let err = ResolveError::MissingSharedConstraint {
            oid: "/gain".into(),
            constraint: "range_x".into(),
        };
        assert_eq!(
            err.to_string(),
            "/gain: missing shared constraint 'range_x'"
        );
        assert_eq!(err.oid(), Some("/gain"));
    }

    #[test]
    fn json_form_carries_kind_and_message() {
        let err = ResolveError::ValueTypeMismatch {
            oid: "/count".into(),
            expected: "int32_value".into(),
            found: "string_value".into(),
        };
        let v = err.to_json_value();
        assert_eq!(v["kind"], "value_type_mismatch");
        assert_eq!(v["oid"], "/count");
        assert!(v["message"]
            .as_str()
            .unwrap()
            .contains("expected int32_value but the value is string_value"));
    }

    #[test]
    fn device_level_errors_have_no_oid() {
        let err = ResolveError::InvalidDevice {
            reason: "default_scope 'admin' is not one of the access scopes".into(),
        };
        assert_eq!(err.oid(), None);
        assert!(err.to_json_value()["oid"].is_null());
    }
}
