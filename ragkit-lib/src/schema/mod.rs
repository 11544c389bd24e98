//! Typed records validated at construction
//!
//! Records are built from untyped JSON by checking every field against its
//! declared type and constraints. Values are never coerced (`"32"` is not an
//! integer). All problems are collected into one [`ValidationErrors`] instead
//! of stopping at the first.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every field error found while validating one record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} validation error(s) for {record}: {}", .errors.len(), join(.errors))]
pub struct ValidationErrors {
    pub record: String,
    pub errors: Vec<FieldError>,
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Accumulates field errors for one record.
#[derive(Debug)]
pub(crate) struct Validator {
    record: &'static str,
    errors: Vec<FieldError>,
}

impl Validator {
    pub(crate) fn new(record: &'static str) -> Self {
        Self {
            record,
            errors: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.errors.is_empty() => Ok(v),
            _ => Err(ValidationErrors {
                record: self.record.to_string(),
                errors: self.errors,
            }),
        }
    }
}

/// Name of a JSON value's type, for error messages.
pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

mod student;

pub use student::*;
