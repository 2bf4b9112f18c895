//! Per-class field tables for the structural pass.

use chrono::DateTime;
use serde_json::Value;
use validator::ValidateUrl;

use jobhub_core::types::SubjectId;
use jobhub_entity::job::{DocumentType, ImageFormat, JobClass};

use super::error::{FieldError, FieldErrorCode};

/// Expected JSON shape of a field.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape {
    /// Any string.
    Text,
    /// Non-negative integer that fits in `u32`.
    Integer,
    /// JSON object.
    Object,
    /// UUID string.
    Uuid,
    /// RFC 3339 timestamp string.
    Timestamp,
    /// Absolute http(s) URL string.
    Url,
    /// Array of absolute http(s) URL strings.
    UrlList,
    /// One of a closed set of strings.
    OneOf(&'static [&'static str]),
}

/// A known payload field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec {
    pub name: &'static str,
    pub shape: Shape,
}

const fn field(name: &'static str, shape: Shape) -> FieldSpec {
    FieldSpec { name, shape }
}

const IDENTITY_VERIFICATION: &[FieldSpec] = &[
    field("userId", Shape::Uuid),
    field("documentType", Shape::OneOf(DocumentType::NAMES)),
    field("documentNumber", Shape::Text),
    field("imageUrls", Shape::UrlList),
    field("selfieUrl", Shape::Url),
];

const IMAGE_TRANSFORM: &[FieldSpec] = &[
    field("ownerId", Shape::Uuid),
    field("imageUrl", Shape::Url),
    field("format", Shape::OneOf(ImageFormat::NAMES)),
    field("width", Shape::Integer),
    field("height", Shape::Integer),
    field("quality", Shape::Integer),
];

const EMAIL_SEND: &[FieldSpec] = &[
    field("to", Shape::Text),
    field("template", Shape::Text),
    field("data", Shape::Object),
    field("userId", Shape::Uuid),
];

const PUSH_NOTIFY: &[FieldSpec] = &[
    field("userId", Shape::Uuid),
    field("title", Shape::Text),
    field("body", Shape::Text),
    field("data", Shape::Object),
];

const ANALYTICS_EVENT: &[FieldSpec] = &[
    field("event", Shape::Text),
    field("userId", Shape::Uuid),
    field("properties", Shape::Object),
    field("occurredAt", Shape::Timestamp),
];

/// Envelope fields shared by every class.
pub(crate) const ENVELOPE: &[FieldSpec] = &[field("correlationId", Shape::Text)];

/// Known fields of a class, in reporting order.
pub(crate) fn fields_for(class: JobClass) -> &'static [FieldSpec] {
    match class {
        JobClass::IdentityVerification => IDENTITY_VERIFICATION,
        JobClass::ImageTransform => IMAGE_TRANSFORM,
        JobClass::EmailSend => EMAIL_SEND,
        JobClass::PushNotify => PUSH_NOTIFY,
        JobClass::AnalyticsEvent => ANALYTICS_EVENT,
    }
}

impl FieldSpec {
    /// Check one present, non-null value.
    pub(crate) fn check(&self, value: &Value) -> Result<(), FieldError> {
        let fail = |code, message: String| Err(FieldError::new(self.name, code, message));

        match self.shape {
            Shape::Text => match value {
                Value::String(_) => Ok(()),
                _ => fail(FieldErrorCode::WrongType, "Expected a string".to_string()),
            },
            Shape::Integer => match value {
                Value::Number(n) => match n.as_u64() {
                    Some(v) if v <= u64::from(u32::MAX) => Ok(()),
                    Some(_) => fail(FieldErrorCode::OutOfRange, "Value is too large".to_string()),
                    None if n.is_i64() => fail(
                        FieldErrorCode::OutOfRange,
                        "Value must not be negative".to_string(),
                    ),
                    None => fail(FieldErrorCode::WrongType, "Expected an integer".to_string()),
                },
                _ => fail(FieldErrorCode::WrongType, "Expected an integer".to_string()),
            },
            Shape::Object => match value {
                Value::Object(_) => Ok(()),
                _ => fail(FieldErrorCode::WrongType, "Expected an object".to_string()),
            },
            Shape::Uuid => match value {
                Value::String(s) if s.parse::<SubjectId>().is_ok() => Ok(()),
                Value::String(_) => fail(FieldErrorCode::Malformed, "Expected a UUID".to_string()),
                _ => fail(FieldErrorCode::WrongType, "Expected a UUID string".to_string()),
            },
            Shape::Timestamp => match value {
                Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok() => Ok(()),
                Value::String(_) => fail(
                    FieldErrorCode::Malformed,
                    "Expected an RFC 3339 timestamp".to_string(),
                ),
                _ => fail(
                    FieldErrorCode::WrongType,
                    "Expected a timestamp string".to_string(),
                ),
            },
            Shape::Url => match value {
                Value::String(s) if is_http_url(s) => Ok(()),
                Value::String(_) => fail(
                    FieldErrorCode::Malformed,
                    "Expected an absolute http(s) URL".to_string(),
                ),
                _ => fail(FieldErrorCode::WrongType, "Expected a URL string".to_string()),
            },
            Shape::UrlList => {
                let Value::Array(items) = value else {
                    return fail(
                        FieldErrorCode::WrongType,
                        "Expected an array of URLs".to_string(),
                    );
                };
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::String(s) if is_http_url(s) => {}
                        Value::String(_) => {
                            return fail(
                                FieldErrorCode::Malformed,
                                format!("Item {i} is not an absolute http(s) URL"),
                            );
                        }
                        _ => {
                            return fail(
                                FieldErrorCode::WrongType,
                                format!("Item {i} is not a string"),
                            );
                        }
                    }
                }
                Ok(())
            }
            Shape::OneOf(names) => match value {
                Value::String(s) if names.contains(&s.as_str()) => Ok(()),
                Value::String(_) => fail(
                    FieldErrorCode::UnknownValue,
                    format!("Expected one of: {}", names.join(", ")),
                ),
                _ => fail(FieldErrorCode::WrongType, "Expected a string".to_string()),
            },
        }
    }
}

fn is_http_url(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://"))
        && s.len() > "https://".len()
        && String::from(s).validate_url()
}
