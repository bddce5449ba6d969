//! Validation results and normalized argument sets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category of a field-level validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    /// Required parameter absent or null.
    Missing,
    /// Value has the wrong JSON type.
    TypeMismatch,
    /// Value has the right type but violates a domain rule.
    Constraint,
    /// Argument not declared by the function schema.
    Unknown,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Missing,
            message: "required parameter is missing".into(),
        }
    }

    pub fn type_mismatch(field: impl Into<String>, expected: &str, found: &str) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::TypeMismatch,
            message: format!("expected {expected}, found {found}"),
        }
    }

    pub fn constraint(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Constraint,
            message: message.into(),
        }
    }

    pub fn unknown(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            kind: FieldErrorKind::Unknown,
            message: "unexpected argument".into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A validated, normalized argument value.
///
/// Variant order matters for untagged deserialization: ISO dates must be
/// tried before plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Date(NaiveDate),
    Text(String),
}

impl ArgValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Arguments that passed validation, in canonical form.
///
/// The only argument shape the backend ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedArgs(BTreeMap<String, ArgValue>);

impl NormalizedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ArgValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.0.get(name) {
            Some(ArgValue::Date(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render back to a JSON object (dates as `YYYY-MM-DD`).
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// Outcome of validating one candidate call against its function schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    /// Present only when `ok` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedArgs>,
    /// Present only when `ok` is false.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn passed(normalized: NormalizedArgs) -> Self {
        Self {
            ok: true,
            normalized: Some(normalized),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<FieldError>) -> Self {
        Self {
            ok: false,
            normalized: None,
            errors,
        }
    }

    /// All field errors joined into one line, e.g. `"slot_id: required parameter is missing"`.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
