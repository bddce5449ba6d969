//! Function and parameter contracts.
//!
//! A `FunctionSpec` is built once at startup and never mutated. It drives the
//! validator and renders to the JSON-schema catalog shown to the model.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

// ── Parameter types ─────────────────────────────────────────────

/// Wire type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    /// Calendar date, `YYYY-MM-DD` on the wire.
    Date,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Date => "date",
        }
    }
}

/// How a string value is canonicalized after sanitizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextForm {
    /// Control characters removed, whitespace trimmed.
    #[default]
    Plain,
    /// Plain, then upper-cased (`p003` → `P003`).
    Identifier,
    /// Plain, then lower-cased with spaces as hyphens (`Primary Care` → `primary-care`).
    Enumerated,
}

/// Domain rule checked after type conversion.
#[derive(Debug, Clone)]
pub enum Constraint {
    MaxLength(usize),
    MinLength(usize),
    Pattern(&'static LazyLock<Regex>),
    OneOf(&'static [&'static str]),
    /// Date must not be after today.
    NotInFuture,
    /// Date must not be before the named date parameter.
    NotBefore(&'static str),
    /// Date must be at most `days` after the named date parameter.
    MaxSpanDays { from: &'static str, days: i64 },
}

// ── ParamSpec ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
    pub form: TextForm,
    pub constraints: Vec<Constraint>,
}

impl ParamSpec {
    fn new(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            description,
            form: TextForm::Plain,
            constraints: Vec::new(),
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::String, description)
    }

    pub fn date(name: &'static str, description: &'static str) -> Self {
        Self::new(name, ParamType::Date, description)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Upper-case the value before pattern checks.
    pub fn identifier(mut self, pattern: &'static LazyLock<Regex>) -> Self {
        self.form = TextForm::Identifier;
        self.constraints.push(Constraint::Pattern(pattern));
        self
    }

    /// Restrict to a fixed vocabulary, compared in enumerated form.
    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.form = TextForm::Enumerated;
        self.constraints.push(Constraint::OneOf(values));
        self
    }

    pub fn max_len(mut self, max: usize) -> Self {
        self.constraints.push(Constraint::MaxLength(max));
        self
    }

    pub fn min_len(mut self, min: usize) -> Self {
        self.constraints.push(Constraint::MinLength(min));
        self
    }

    pub fn not_in_future(mut self) -> Self {
        self.constraints.push(Constraint::NotInFuture);
        self
    }

    pub fn not_before(mut self, other: &'static str) -> Self {
        self.constraints.push(Constraint::NotBefore(other));
        self
    }

    pub fn max_span_days(mut self, from: &'static str, days: i64) -> Self {
        self.constraints.push(Constraint::MaxSpanDays { from, days });
        self
    }

    /// JSON-schema property object for this parameter.
    pub fn to_json_schema(&self) -> Value {
        let mut prop = Map::new();
        match self.ty {
            ParamType::Date => {
                prop.insert("type".into(), json!("string"));
                prop.insert("format".into(), json!("date"));
            }
            other => {
                prop.insert("type".into(), json!(other.as_str()));
            }
        }
        prop.insert("description".into(), json!(self.description));
        for constraint in &self.constraints {
            match constraint {
                Constraint::MaxLength(n) => {
                    prop.insert("maxLength".into(), json!(n));
                }
                Constraint::MinLength(n) => {
                    prop.insert("minLength".into(), json!(n));
                }
                Constraint::Pattern(re) => {
                    prop.insert("pattern".into(), json!(re.as_str()));
                }
                Constraint::OneOf(values) => {
                    prop.insert("enum".into(), json!(values));
                }
                Constraint::NotInFuture
                | Constraint::NotBefore(_)
                | Constraint::MaxSpanDays { .. } => {}
            }
        }
        Value::Object(prop)
    }
}

// ── FunctionSpec ────────────────────────────────────────────────

/// Contract of one callable workflow operation.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    /// Parameters in declaration order.
    pub params: Vec<ParamSpec>,
    /// Changes backend state (requires confirmation in LIVE mode).
    pub mutates: bool,
    /// Offered to callers and the model. Hidden functions are refused by scope.
    pub exposed: bool,
}

impl FunctionSpec {
    pub fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            params: Vec::new(),
            mutates: false,
            exposed: true,
        }
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn mutating(mut self) -> Self {
        self.mutates = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.exposed = false;
        self
    }

    pub fn get_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.params.iter().filter(|p| p.required)
    }

    /// JSON-schema object describing the accepted arguments.
    pub fn to_json_schema(&self) -> Value {
        let properties = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.to_json_schema()))
            .collect::<Map<_, _>>();
        let required: Vec<&str> = self.required_params().map(|p| p.name).collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }

    /// Model-facing catalog entry: name, description, parameter schema.
    pub fn catalog_entry(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "mutates_state": self.mutates,
            "parameters": self.to_json_schema(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SLOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^S\d+$").unwrap());

    fn sample() -> FunctionSpec {
        FunctionSpec::new("book_appointment", "Book a slot")
            .param(ParamSpec::string("slot_id", "Slot to book").required().identifier(&SLOT_RE))
            .param(ParamSpec::string("reason", "Visit reason").required().min_len(1).max_len(500))
            .param(ParamSpec::date("on", "Preferred date"))
            .mutating()
    }

    #[test]
    fn schema_lists_required_and_constraints() {
        let schema = sample().to_json_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["slot_id", "reason"]));
        assert_eq!(schema["properties"]["slot_id"]["pattern"], r"^S\d+$");
        assert_eq!(schema["properties"]["reason"]["maxLength"], 500);
        assert_eq!(schema["properties"]["on"]["format"], "date");
    }

    #[test]
    fn builder_flags() {
        let spec = sample();
        assert!(spec.mutates);
        assert!(spec.exposed);
        assert!(!spec.clone().hidden().exposed);
        assert_eq!(
            spec.get_param("slot_id").map(|p| p.form),
            Some(TextForm::Identifier)
        );
        assert!(spec.get_param("missing").is_none());
    }

    #[test]
    fn one_of_switches_to_enumerated_form() {
        static SERVICES: &[&str] = &["cardiology", "primary-care"];
        let p = ParamSpec::string("service_type", "Service").one_of(SERVICES);
        assert_eq!(p.form, TextForm::Enumerated);
        assert_eq!(p.to_json_schema()["enum"], json!(["cardiology", "primary-care"]));
    }

    #[test]
    fn catalog_entry_has_name_and_schema() {
        let entry = sample().catalog_entry();
        assert_eq!(entry["name"], "book_appointment");
        assert_eq!(entry["mutates_state"], true);
        assert!(entry["parameters"]["properties"].is_object());
    }
}
