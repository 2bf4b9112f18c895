//! The schema registry: raw JSON in, typed job request or field errors out.

use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use jobhub_entity::job::{JobClass, JobPayload, JobRequest};

use super::error::{FieldError, FieldErrorCode};
use super::fields::{ENVELOPE, FieldSpec, fields_for};
use super::forms::{
    AnalyticsEventForm, EmailSendForm, EnvelopeForm, IdentityVerificationForm,
    ImageTransformForm, PayloadForm, PushNotifyForm,
};

/// Field carrying the job class in a submission body.
pub const JOB_CLASS_FIELD: &str = "jobClass";

/// Validates raw submissions against per-class schemas.
///
/// Pure and synchronous. Unknown fields are ignored; `null` is treated as
/// absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaRegistry;

impl SchemaRegistry {
    /// Create a registry.
    pub fn new() -> Self {
        Self
    }

    /// Resolve a job class name. Unknown names fail on `jobClass`.
    pub fn resolve_class(&self, name: &str) -> Result<JobClass, FieldError> {
        name.parse::<JobClass>().map_err(|_| {
            let known: Vec<&str> = JobClass::ALL.iter().map(JobClass::as_str).collect();
            FieldError::new(
                JOB_CLASS_FIELD,
                FieldErrorCode::UnknownValue,
                format!("Unknown job class; expected one of: {}", known.join(", ")),
            )
        })
    }

    /// Validate `raw` as a payload of `class`.
    ///
    /// Every failure is collected; the result is either a fully typed
    /// request or the complete list of field errors.
    pub fn validate(&self, class: JobClass, raw: &Value) -> Result<JobRequest, Vec<FieldError>> {
        let Value::Object(object) = raw else {
            return Err(vec![FieldError::new(
                "body",
                FieldErrorCode::WrongType,
                "Payload must be a JSON object",
            )]);
        };

        let specs = fields_for(class);
        let mut errors = Vec::new();
        let cleaned = structural_pass(object, specs, &mut errors);
        let envelope = structural_pass(object, ENVELOPE, &mut errors);

        let payload = match class {
            JobClass::IdentityVerification => {
                check_form::<IdentityVerificationForm>(cleaned, &mut errors)
            }
            JobClass::ImageTransform => check_form::<ImageTransformForm>(cleaned, &mut errors),
            JobClass::EmailSend => check_form::<EmailSendForm>(cleaned, &mut errors),
            JobClass::PushNotify => check_form::<PushNotifyForm>(cleaned, &mut errors),
            JobClass::AnalyticsEvent => check_form::<AnalyticsEventForm>(cleaned, &mut errors),
        };
        let correlation_id = check_envelope(envelope, &mut errors);

        sort_errors(&mut errors, specs);
        match payload {
            Some(payload) if errors.is_empty() => Ok(JobRequest::new(payload, correlation_id)),
            Some(_) => Err(errors),
            None if errors.is_empty() => Err(vec![FieldError::new(
                "body",
                FieldErrorCode::Malformed,
                "Payload could not be interpreted",
            )]),
            None => Err(errors),
        }
    }
}

/// Copy known, well-shaped fields into a new object; report the rest.
fn structural_pass(
    object: &Map<String, Value>,
    specs: &[FieldSpec],
    errors: &mut Vec<FieldError>,
) -> Map<String, Value> {
    let mut cleaned = Map::new();
    for spec in specs {
        match object.get(spec.name) {
            None | Some(Value::Null) => {}
            Some(value) => match spec.check(value) {
                Ok(()) => {
                    cleaned.insert(spec.name.to_string(), value.clone());
                }
                Err(err) => errors.push(err),
            },
        }
    }
    cleaned
}

fn check_form<F: PayloadForm>(
    cleaned: Map<String, Value>,
    errors: &mut Vec<FieldError>,
) -> Option<JobPayload> {
    let form: F = match serde_json::from_value(Value::Object(cleaned)) {
        Ok(form) => form,
        Err(e) => {
            errors.push(FieldError::new("body", FieldErrorCode::Malformed, e.to_string()));
            return None;
        }
    };

    if let Err(validation) = form.validate() {
        merge_validation_errors(&validation, errors);
        return None;
    }
    form.into_payload()
}

fn check_envelope(cleaned: Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    let envelope: EnvelopeForm = serde_json::from_value(Value::Object(cleaned)).ok()?;
    if let Err(validation) = envelope.validate() {
        merge_validation_errors(&validation, errors);
        return None;
    }
    envelope.correlation_id
}

/// Translate `validator` errors, skipping fields the structural pass already
/// reported.
fn merge_validation_errors(validation: &validator::ValidationErrors, errors: &mut Vec<FieldError>) {
    for (field, failures) in validation.field_errors() {
        let name = camel_case(&field);
        if errors.iter().any(|e| e.field == name) {
            continue;
        }
        if let Some(failure) = failures.first() {
            let (code, message) = describe(failure);
            errors.push(FieldError::new(name, code, message));
        }
    }
}

fn describe(failure: &ValidationError) -> (FieldErrorCode, String) {
    let bound = |key: &str| failure.params.get(key).map(Value::to_string);
    let code = match &*failure.code {
        "required" => FieldErrorCode::Missing,
        "length" | "range" => FieldErrorCode::OutOfRange,
        _ => FieldErrorCode::Malformed,
    };

    if let Some(message) = failure.message.as_deref() {
        return (code, message.to_string());
    }
    let message = match (&*failure.code, bound("min"), bound("max")) {
        ("required", _, _) => "Field is required".to_string(),
        ("length", Some(min), Some(max)) => format!("Length must be between {min} and {max}"),
        ("length", Some(min), None) => format!("Length must be at least {min}"),
        ("length", None, Some(max)) => format!("Length must be at most {max}"),
        ("range", Some(min), Some(max)) => format!("Value must be between {min} and {max}"),
        ("email", _, _) => "Expected an email address".to_string(),
        (other, _, _) => format!("Failed '{other}' check"),
    };
    (code, message)
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Order errors by the class's field table, then envelope fields, then code.
fn sort_errors(errors: &mut [FieldError], specs: &[FieldSpec]) {
    let position = |field: &str| {
        specs
            .iter()
            .chain(ENVELOPE)
            .position(|s| s.name == field)
            .unwrap_or(usize::MAX)
    };
    errors.sort_by(|a, b| {
        position(&a.field)
            .cmp(&position(&b.field))
            .then(a.code.cmp(&b.code))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use jobhub_entity::job::{DocumentType, ImageFormat};

    const USER: &str = "0190f5c2-0000-7000-8000-000000000002";

    fn errors_of(class: JobClass, raw: Value) -> Vec<(String, FieldErrorCode)> {
        SchemaRegistry::new()
            .validate(class, &raw)
            .unwrap_err()
            .into_iter()
            .map(|e| (e.field, e.code))
            .collect()
    }

    #[test]
    fn test_email_send_minimal() {
        let request = SchemaRegistry::new()
            .validate(
                JobClass::EmailSend,
                &json!({ "jobClass": "EmailSend", "to": "a@b.com", "template": "welcome", "data": {} }),
            )
            .unwrap();

        assert_eq!(request.class(), JobClass::EmailSend);
        assert_eq!(request.correlation_id(), None);
        match request.payload() {
            JobPayload::EmailSend(p) => {
                assert_eq!(p.to, "a@b.com");
                assert_eq!(p.template, "welcome");
                assert!(p.data.is_empty());
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn test_identity_verification_reports_every_failure() {
        let errors = errors_of(
            JobClass::IdentityVerification,
            json!({ "jobClass": "IdentityVerification", "documentNumber": "ab" }),
        );
        assert_eq!(
            errors,
            vec![
                ("userId".to_string(), FieldErrorCode::Missing),
                ("documentType".to_string(), FieldErrorCode::Missing),
                ("documentNumber".to_string(), FieldErrorCode::OutOfRange),
                ("imageUrls".to_string(), FieldErrorCode::Missing),
            ]
        );
    }

    #[test]
    fn test_identity_verification_valid() {
        let request = SchemaRegistry::new()
            .validate(
                JobClass::IdentityVerification,
                &json!({
                    "userId": USER,
                    "documentType": "passport",
                    "documentNumber": "X1234567",
                    "imageUrls": ["https://uploads.example.com/front.jpg"],
                    "correlationId": "req-7",
                    "someFutureField": true
                }),
            )
            .unwrap();

        assert_eq!(request.correlation_id(), Some("req-7"));
        assert_eq!(request.subject_id().map(|s| s.to_string()), Some(USER.to_string()));
        let JobPayload::IdentityVerification(p) = request.payload() else {
            panic!("wrong payload");
        };
        assert_eq!(p.document_type, DocumentType::Passport);
        assert_eq!(p.selfie_url, None);
    }

    #[test]
    fn test_empty_image_list_is_out_of_range() {
        let errors = errors_of(
            JobClass::IdentityVerification,
            json!({
                "userId": USER,
                "documentType": "passport",
                "documentNumber": "X1234567",
                "imageUrls": []
            }),
        );
        assert_eq!(errors, vec![("imageUrls".to_string(), FieldErrorCode::OutOfRange)]);
    }

    #[test]
    fn test_wrong_type_is_not_also_reported_missing() {
        let errors = errors_of(
            JobClass::EmailSend,
            json!({ "to": 42, "template": "welcome", "data": [] }),
        );
        assert_eq!(
            errors,
            vec![
                ("to".to_string(), FieldErrorCode::WrongType),
                ("data".to_string(), FieldErrorCode::WrongType),
            ]
        );
    }

    #[test]
    fn test_malformed_email_uuid_and_enum() {
        let errors = errors_of(
            JobClass::EmailSend,
            json!({ "to": "not-an-email", "template": "welcome", "data": {}, "userId": "u-1" }),
        );
        assert_eq!(
            errors,
            vec![
                ("to".to_string(), FieldErrorCode::Malformed),
                ("userId".to_string(), FieldErrorCode::Malformed),
            ]
        );

        let errors = errors_of(
            JobClass::ImageTransform,
            json!({ "ownerId": USER, "imageUrl": "https://a.example/x.png", "format": "bmp" }),
        );
        assert_eq!(errors, vec![("format".to_string(), FieldErrorCode::UnknownValue)]);
    }

    #[test]
    fn test_image_transform_ranges() {
        let errors = errors_of(
            JobClass::ImageTransform,
            json!({
                "ownerId": USER,
                "imageUrl": "https://a.example/x.png",
                "format": "webp",
                "width": 0,
                "quality": 101
            }),
        );
        assert_eq!(
            errors,
            vec![
                ("width".to_string(), FieldErrorCode::OutOfRange),
                ("quality".to_string(), FieldErrorCode::OutOfRange),
            ]
        );

        let request = SchemaRegistry::new()
            .validate(
                JobClass::ImageTransform,
                &json!({
                    "ownerId": USER,
                    "imageUrl": "https://a.example/x.png",
                    "format": "webp",
                    "width": 640,
                    "quality": 80
                }),
            )
            .unwrap();
        let JobPayload::ImageTransform(p) = request.payload() else {
            panic!("wrong payload");
        };
        assert_eq!(p.format, ImageFormat::Webp);
        assert_eq!(p.quality, Some(80));
        assert_eq!(p.height, None);
    }

    #[test]
    fn test_correlation_id_bounds() {
        let long = "x".repeat(129);
        let errors = errors_of(
            JobClass::AnalyticsEvent,
            json!({ "event": "signup", "correlationId": long }),
        );
        assert_eq!(errors, vec![("correlationId".to_string(), FieldErrorCode::OutOfRange)]);
    }

    #[test]
    fn test_null_counts_as_absent() {
        let request = SchemaRegistry::new()
            .validate(
                JobClass::AnalyticsEvent,
                &json!({ "event": "signup", "userId": null, "occurredAt": "2026-03-01T12:00:00+02:00" }),
            )
            .unwrap();
        let JobPayload::AnalyticsEvent(p) = request.payload() else {
            panic!("wrong payload");
        };
        assert_eq!(p.user_id, None);
        assert_eq!(p.occurred_at.map(|t| t.to_rfc3339()), Some("2026-03-01T10:00:00+00:00".to_string()));
    }

    #[test]
    fn test_non_object_payload() {
        let errors = errors_of(JobClass::PushNotify, json!(["a"]));
        assert_eq!(errors, vec![("body".to_string(), FieldErrorCode::WrongType)]);
    }

    #[test]
    fn test_resolve_class() {
        let registry = SchemaRegistry::new();
        assert_eq!(registry.resolve_class("push-notify"), Ok(JobClass::PushNotify));
        let err = registry.resolve_class("FaxSend").unwrap_err();
        assert_eq!(err.field, "jobClass");
        assert_eq!(err.code, FieldErrorCode::UnknownValue);
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("document_number"), "documentNumber");
        assert_eq!(camel_case("imageUrls"), "imageUrls");
    }
}
