//! Typed field access for raw venue records.
//!
//! Venue history endpoints return loosely typed JSON objects. A
//! [`RecordReader`] wraps one object and hands out typed fields, keeping a
//! missing key apart from a key whose value has the wrong shape.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::{ErrorCategory, ErrorClassification};

/// Errors raised while reading a single record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Record is not a JSON object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),

    /// Required key absent
    #[error("missing key entry for {0}")]
    MissingField(String),

    /// Key present with a value of the wrong type or an unparseable value
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Key name
        field: String,
        /// What was wrong with it
        reason: String,
    },
}

impl RecordError {
    /// Create an invalid-field error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl ErrorClassification for RecordError {
    fn category(&self) -> ErrorCategory {
        ErrorCategory::Permanent
    }
}

/// Short description of a JSON value's type for error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Borrowing reader over one JSON object.
#[derive(Debug, Clone, Copy)]
pub struct RecordReader<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> RecordReader<'a> {
    /// Wrap a JSON value, which must be an object.
    pub fn new(value: &'a Value) -> Result<Self, RecordError> {
        value
            .as_object()
            .map(|fields| Self { fields })
            .ok_or_else(|| RecordError::NotAnObject(kind_of(value).to_string()))
    }

    fn get(&self, field: &str) -> Result<&'a Value, RecordError> {
        self.fields
            .get(field)
            .ok_or_else(|| RecordError::MissingField(field.to_string()))
    }

    /// Returns true if the key is present, whatever its value.
    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Required string field.
    pub fn required_str(&self, field: &str) -> Result<&'a str, RecordError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.as_str()),
            other => Err(RecordError::invalid(
                field,
                format!("expected string, got {}", kind_of(other)),
            )),
        }
    }

    /// Optional string field; absent and null both map to `None`.
    pub fn optional_str(&self, field: &str) -> Result<Option<&'a str>, RecordError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(RecordError::invalid(
                field,
                format!("expected string, got {}", kind_of(other)),
            )),
        }
    }

    /// Required identifier, accepted as a string or an integer and returned as
    /// a string.
    pub fn required_id(&self, field: &str) -> Result<String, RecordError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            other => Err(RecordError::invalid(
                field,
                format!("expected identifier, got {}", kind_of(other)),
            )),
        }
    }

    /// Optional identifier, see [`Self::required_id`].
    pub fn optional_id(&self, field: &str) -> Result<Option<String>, RecordError> {
        match self.fields.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.required_id(field).map(Some),
        }
    }

    /// Required decimal, accepted as a JSON number or a numeric string.
    pub fn required_decimal(&self, field: &str) -> Result<Decimal, RecordError> {
        let parsed = match self.get(field)? {
            Value::String(s) => Decimal::from_str(s.trim())
                .or_else(|_| Decimal::from_scientific(s.trim())),
            Value::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
            }
            other => {
                return Err(RecordError::invalid(
                    field,
                    format!("expected number, got {}", kind_of(other)),
                ))
            }
        };
        parsed.map_err(|e| RecordError::invalid(field, e.to_string()))
    }

    /// Required integer, accepted as a JSON integer or an integer string.
    pub fn required_i64(&self, field: &str) -> Result<i64, RecordError> {
        match self.get(field)? {
            Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| RecordError::invalid(field, format!("{} is not an integer", n))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| RecordError::invalid(field, format!("{:?}: {}", s, e))),
            other => Err(RecordError::invalid(
                field,
                format!("expected integer, got {}", kind_of(other)),
            )),
        }
    }

    /// Required array.
    pub fn required_array(&self, field: &str) -> Result<&'a Vec<Value>, RecordError> {
        match self.get(field)? {
            Value::Array(items) => Ok(items),
            other => Err(RecordError::invalid(
                field,
                format!("expected array, got {}", kind_of(other)),
            )),
        }
    }

    /// Required boolean.
    pub fn required_bool(&self, field: &str) -> Result<bool, RecordError> {
        match self.get(field)? {
            Value::Bool(b) => Ok(*b),
            other => Err(RecordError::invalid(
                field,
                format!("expected boolean, got {}", kind_of(other)),
            )),
        }
    }
}
