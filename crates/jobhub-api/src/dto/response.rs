//! Response bodies.

use serde::{Deserialize, Serialize};

use jobhub_core::types::{JobHandle, JobSnapshot, JobState, JobTimestamps};
use jobhub_entity::job::JobClass;

/// Body of `202 Accepted` for a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    /// Broker-assigned handle.
    pub handle: JobHandle,
    /// Where the job's status can be polled.
    pub status_location: String,
}

/// Job status as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    /// Job handle.
    pub handle: JobHandle,
    /// Class of the job, when its queue maps to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_class: Option<JobClass>,
    /// Lifecycle state.
    pub state: JobState,
    /// Progress 0–100.
    pub progress: u8,
    /// Result of a completed job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Reason of the latest failed attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Attempts started so far.
    pub attempts_made: u32,
    /// Attempt budget.
    pub max_attempts: u32,
    /// Caller-supplied correlation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Lifecycle timestamps.
    pub timestamps: JobTimestamps,
}

impl From<JobSnapshot> for JobStatusResponse {
    fn from(snapshot: JobSnapshot) -> Self {
        Self {
            handle: snapshot.handle,
            job_class: JobClass::from_queue_name(&snapshot.queue),
            state: snapshot.state,
            progress: snapshot.progress,
            result: snapshot.result,
            failure_reason: snapshot.failure_reason,
            attempts_made: snapshot.attempts_made,
            max_attempts: snapshot.max_attempts,
            correlation_id: snapshot.correlation_id,
            timestamps: snapshot.timestamps,
        }
    }
}

/// Empty acknowledgement of an accepted webhook.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookAck {}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since the server started.
    pub uptime_seconds: u64,
    /// Broker reachability.
    pub broker: String,
    /// Store reachability.
    pub database: String,
}
