//! Input validator.
//!
//! Checks candidate arguments against a `FunctionSpec` and normalizes them.
//! Pure: never touches the backend, and reads the clock only for
//! not-in-future checks (`validate_at` takes the date explicitly).

use chrono::{Local, NaiveDate};
use serde_json::Value;

use cw_protocol::validation::{ArgValue, FieldError, FieldErrorKind, NormalizedArgs, ValidationResult};

use crate::spec::{Constraint, FunctionSpec, ParamSpec, ParamType, TextForm};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate against today's local date.
pub fn validate(spec: &FunctionSpec, args: &Value) -> ValidationResult {
    validate_at(spec, args, Local::now().date_naive())
}

/// Validate with an explicit "today" for not-in-future checks.
pub fn validate_at(spec: &FunctionSpec, args: &Value, today: NaiveDate) -> ValidationResult {
    let Some(obj) = args.as_object() else {
        return ValidationResult::failed(vec![FieldError::type_mismatch(
            "arguments",
            "object",
            json_type(args),
        )]);
    };

    let mut errors = Vec::new();

    for key in obj.keys() {
        if spec.get_param(key).is_none() {
            errors.push(FieldError::unknown(key.as_str()));
        }
    }

    let mut normalized = NormalizedArgs::new();
    for param in &spec.params {
        match obj.get(param.name) {
            None | Some(Value::Null) => {
                if param.required {
                    errors.push(FieldError::missing(param.name));
                }
            }
            Some(raw) => match convert(param, raw, today) {
                Ok(Some(value)) => normalized.insert(param.name, value),
                Ok(None) => {}
                Err(err) => errors.push(err),
            },
        }
    }

    // Cross-field rules need both dates converted first.
    for param in &spec.params {
        let Some(value) = normalized.date(param.name) else {
            continue;
        };
        for constraint in &param.constraints {
            match constraint {
                Constraint::NotBefore(other) => {
                    if let Some(start) = normalized.date(other) {
                        if value < start {
                            errors.push(FieldError::constraint(
                                param.name,
                                format!("must not be before {other}"),
                            ));
                        }
                    }
                }
                Constraint::MaxSpanDays { from, days } => {
                    if let Some(start) = normalized.date(from) {
                        if (value - start).num_days() > *days {
                            errors.push(FieldError::constraint(
                                param.name,
                                format!("date range must not exceed {days} days"),
                            ));
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if errors.is_empty() {
        ValidationResult::passed(normalized)
    } else {
        ValidationResult::failed(errors)
    }
}

/// Failed result for a call naming a function outside the catalog.
pub fn unknown_function(name: &str) -> ValidationResult {
    ValidationResult::failed(vec![FieldError {
        field: "function_name".into(),
        kind: FieldErrorKind::Unknown,
        message: format!("unknown function '{name}'"),
    }])
}

/// Convert one present, non-null value. `Ok(None)` drops a blank optional string.
fn convert(param: &ParamSpec, raw: &Value, today: NaiveDate) -> Result<Option<ArgValue>, FieldError> {
    match param.ty {
        ParamType::String => {
            let Value::String(s) = raw else {
                return Err(FieldError::type_mismatch(param.name, "string", json_type(raw)));
            };
            let text = normalize_text(s, param.form);
            if text.is_empty() {
                if param.required {
                    return Err(FieldError::constraint(param.name, "must not be empty"));
                }
                return Ok(None);
            }
            check_text(param, &text)?;
            Ok(Some(ArgValue::Text(text)))
        }
        ParamType::Date => {
            let Value::String(s) = raw else {
                return Err(FieldError::type_mismatch(param.name, "date string", json_type(raw)));
            };
            let date = NaiveDate::parse_from_str(sanitize(s).as_str(), DATE_FORMAT).map_err(|_| {
                FieldError::constraint(param.name, "expected a date in YYYY-MM-DD format")
            })?;
            if param
                .constraints
                .iter()
                .any(|c| matches!(c, Constraint::NotInFuture))
                && date > today
            {
                return Err(FieldError::constraint(param.name, "must not be in the future"));
            }
            Ok(Some(ArgValue::Date(date)))
        }
    }
}

fn check_text(param: &ParamSpec, text: &str) -> Result<(), FieldError> {
    let len = text.chars().count();
    for constraint in &param.constraints {
        match constraint {
            Constraint::MaxLength(max) if len > *max => {
                return Err(FieldError::constraint(
                    param.name,
                    format!("must be at most {max} characters"),
                ));
            }
            Constraint::MinLength(min) if len < *min => {
                return Err(FieldError::constraint(
                    param.name,
                    format!("must be at least {min} characters"),
                ));
            }
            Constraint::Pattern(re) if !re.is_match(text) => {
                return Err(FieldError::constraint(
                    param.name,
                    format!("'{text}' does not match {}", re.as_str()),
                ));
            }
            Constraint::OneOf(values) if !values.contains(&text) => {
                return Err(FieldError::constraint(
                    param.name,
                    format!("'{text}' is not one of: {}", values.join(", ")),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Strip control characters and surrounding whitespace.
fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn normalize_text(s: &str, form: TextForm) -> String {
    let clean = sanitize(s);
    match form {
        TextForm::Plain => clean,
        TextForm::Identifier => clean.to_uppercase(),
        TextForm::Enumerated => clean
            .to_lowercase()
            .replace('_', " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-"),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
