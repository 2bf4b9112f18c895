//! Completion event delivered by a worker.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use jobhub_core::types::{JobHandle, SubjectId};

use crate::job::{JobClass, UnknownJobClass};

/// Terminal status reported by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    /// The job succeeded.
    Completed,
    /// The job terminally failed.
    Failed,
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Body of `POST /webhooks/job-complete`.
///
/// Carries no trust of its own; it is only parsed after the request
/// signature has been verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Handle of the finished job.
    pub job_handle: JobHandle,
    /// Subject the job acted on.
    pub subject_id: SubjectId,
    /// Job class as reported by the worker. Kept as a string so unknown
    /// classes can be logged and dropped instead of rejected.
    pub job_class: String,
    /// Terminal status.
    pub status: CompletionStatus,
    /// Result object on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error descriptor on failure: a string or an object with `message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl WebhookEvent {
    /// Parse the reported job class.
    pub fn class(&self) -> Result<JobClass, UnknownJobClass> {
        self.job_class.parse()
    }

    /// Best-effort extraction of the worker's error message.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(Value::Object(map.clone()).to_string())),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(error: Option<Value>) -> WebhookEvent {
        WebhookEvent {
            job_handle: JobHandle::new(),
            subject_id: SubjectId::new(),
            job_class: "IdentityVerification".to_string(),
            status: CompletionStatus::Failed,
            result: None,
            error,
        }
    }

    #[test]
    fn test_parses_camel_case_body() {
        let handle = JobHandle::new();
        let subject = SubjectId::new();
        let body = serde_json::json!({
            "jobHandle": handle,
            "subjectId": subject,
            "jobClass": "EmailSend",
            "status": "completed",
            "result": { "messageId": "m-1" },
        });
        let event: WebhookEvent = serde_json::from_value(body).expect("deserialize");
        assert_eq!(event.job_handle, handle);
        assert_eq!(event.class(), Ok(JobClass::EmailSend));
        assert_eq!(event.status, CompletionStatus::Completed);
        assert!(event.error.is_none());
    }

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            event(Some(Value::String("timeout".into()))).error_message(),
            Some("timeout".to_string())
        );
        assert_eq!(
            event(Some(serde_json::json!({ "message": "blurry", "code": "E42" }))).error_message(),
            Some("blurry".to_string())
        );
        assert_eq!(event(None).error_message(), None);
    }
}
