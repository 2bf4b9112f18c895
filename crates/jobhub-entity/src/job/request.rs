//! The immutable, validated job request.

use jobhub_core::types::SubjectId;

use super::class::JobClass;
use super::payload::JobPayload;

/// A job request that passed schema validation. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    payload: JobPayload,
    correlation_id: Option<String>,
}

impl JobRequest {
    /// Build a request from an already-validated payload.
    pub fn new(payload: JobPayload, correlation_id: Option<String>) -> Self {
        Self {
            payload,
            correlation_id,
        }
    }

    /// Job class.
    pub fn class(&self) -> JobClass {
        self.payload.class()
    }

    /// Typed payload.
    pub fn payload(&self) -> &JobPayload {
        &self.payload
    }

    /// Caller-supplied correlation id.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Subject the job acts on behalf of.
    pub fn subject_id(&self) -> Option<SubjectId> {
        self.payload.subject_id()
    }

    /// Split into payload and correlation id.
    pub fn into_parts(self) -> (JobPayload, Option<String>) {
        (self.payload, self.correlation_id)
    }
}
