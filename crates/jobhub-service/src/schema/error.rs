//! Field-level validation failures.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a field failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorCode {
    /// A required field is absent or null.
    Missing,
    /// The JSON kind is wrong (e.g. a number where a string is expected).
    WrongType,
    /// A length or numeric bound is violated.
    OutOfRange,
    /// A UUID, URL, email or timestamp does not parse.
    Malformed,
    /// A value is outside a closed set (enum, job class).
    UnknownValue,
}

impl FieldErrorCode {
    /// Return the code as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::WrongType => "wrong_type",
            Self::OutOfRange => "out_of_range",
            Self::Malformed => "malformed",
            Self::UnknownValue => "unknown_value",
        }
    }
}

impl fmt::Display for FieldErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failed field of a submitted payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Payload field name, as sent by the client.
    pub field: String,
    /// Failure category.
    pub code: FieldErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    pub fn new(field: impl Into<String>, code: FieldErrorCode, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code,
            message: message.into(),
        }
    }
}
