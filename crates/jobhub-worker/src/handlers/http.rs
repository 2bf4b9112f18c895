//! Handler that delegates execution to an external HTTP executor.
//!
//! The executor receives `{jobHandle, jobClass, attempt, payload}` as JSON and
//! answers with the job result. Server errors, timeouts and connection
//! failures are transient; any other non-success status is permanent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::types::{ClaimedJob, JobHandle};
use jobhub_entity::job::{JobClass, JobPayload};

use crate::executor::{JobExecutionError, JobHandler};

/// Request body sent to the executor.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DelegateRequest<'a> {
    job_handle: JobHandle,
    job_class: JobClass,
    attempt: u32,
    payload: &'a JobPayload,
}

/// Forwards jobs of one class to an external executor.
#[derive(Debug, Clone)]
pub struct HttpDelegateHandler {
    class: JobClass,
    endpoint: String,
    client: Client,
}

impl HttpDelegateHandler {
    /// Create a delegate posting to `endpoint` with a per-request timeout.
    pub fn new(class: JobClass, endpoint: String, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::with_source(
                jobhub_core::error::ErrorKind::Configuration,
                format!("Failed to build HTTP client for {class} executor"),
                e,
            )
        })?;
        Ok(Self {
            class,
            endpoint,
            client,
        })
    }

    /// Executor endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl JobHandler for HttpDelegateHandler {
    fn class(&self) -> JobClass {
        self.class
    }

    async fn execute(
        &self,
        job: &ClaimedJob,
        payload: &JobPayload,
    ) -> Result<Value, JobExecutionError> {
        let request = DelegateRequest {
            job_handle: job.handle,
            job_class: self.class,
            attempt: job.attempt,
            payload,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                JobExecutionError::Transient(format!("Executor request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                handle = %job.handle,
                status = status.as_u16(),
                "Executor returned error status"
            );
            return Err(classify_status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            JobExecutionError::Transient(format!("Failed to read executor response: {e}"))
        })?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| {
            JobExecutionError::Permanent(format!("Executor returned invalid JSON: {e}"))
        })
    }
}

/// Map a non-success executor status to a retry decision.
fn classify_status(status: StatusCode) -> JobExecutionError {
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        JobExecutionError::Transient(format!("Executor unavailable ({status})"))
    } else {
        JobExecutionError::Permanent(format!("Executor rejected job ({status})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(classify_status(StatusCode::BAD_GATEWAY).is_retryable());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS).is_retryable());
        assert!(!classify_status(StatusCode::BAD_REQUEST).is_retryable());
        assert!(!classify_status(StatusCode::UNPROCESSABLE_ENTITY).is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_executor_is_transient() {
        let handler = HttpDelegateHandler::new(
            JobClass::EmailSend,
            "http://127.0.0.1:9/run".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        let job = ClaimedJob {
            handle: JobHandle::new(),
            queue: "email-send".to_string(),
            payload: Value::Null,
            attempt: 1,
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            lock_token: uuid::Uuid::new_v4(),
            lock_expires_at: chrono::Utc::now(),
        };
        let payload = JobPayload::EmailSend(jobhub_entity::job::EmailSendPayload {
            to: "a@b.com".to_string(),
            template: "welcome".to_string(),
            data: serde_json::Map::new(),
            user_id: None,
        });

        let err = handler.execute(&job, &payload).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
