//! Job executor: dispatches claimed jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use jobhub_core::config::WorkerConfig;
use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::types::ClaimedJob;
use jobhub_entity::job::{JobClass, JobPayload};

use crate::handlers::HttpDelegateHandler;

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// The job class this handler processes
    fn class(&self) -> JobClass;

    /// Execute one attempt of the job
    async fn execute(&self, job: &ClaimedJob, payload: &JobPayload)
        -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure, do not retry
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure, may retry within the attempt budget
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

impl JobExecutionError {
    /// Whether the broker should schedule another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Dispatches jobs to the appropriate handler based on their class
#[derive(Debug, Default)]
pub struct JobExecutor {
    handlers: HashMap<JobClass, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create an executor with no handlers
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an executor with one HTTP delegate per configured executor URL.
    ///
    /// Keys of `worker.executors` are queue names; an unknown key is a
    /// configuration error.
    pub fn from_config(config: &WorkerConfig) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.http_timeout_seconds);
        let mut executor = Self::new();
        for (queue, endpoint) in &config.executors {
            let class = JobClass::from_queue_name(queue).ok_or_else(|| {
                AppError::configuration(format!(
                    "Unknown queue '{queue}' in worker.executors"
                ))
            })?;
            executor.register(Arc::new(HttpDelegateHandler::new(
                class,
                endpoint.clone(),
                timeout,
            )?));
        }
        Ok(executor)
    }

    /// Register a job handler, replacing any previous one for its class
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let class = handler.class();
        tracing::info!(class = %class, "Registered job handler");
        self.handlers.insert(class, handler);
    }

    /// Execute a job by dispatching to the handler of its class
    pub async fn execute(
        &self,
        job: &ClaimedJob,
        payload: &JobPayload,
    ) -> Result<Value, JobExecutionError> {
        let class = payload.class();
        let handler = self.handlers.get(&class).ok_or_else(|| {
            JobExecutionError::Permanent(format!("No handler registered for job class '{class}'"))
        })?;

        tracing::debug!(
            handle = %job.handle,
            class = %class,
            attempt = job.attempt,
            max_attempts = job.max_attempts,
            "Executing job"
        );

        handler.execute(job, payload).await
    }

    /// Check if a handler is registered for a class
    pub fn has_handler(&self, class: JobClass) -> bool {
        self.handlers.contains_key(&class)
    }

    /// Classes with a registered handler
    pub fn registered_classes(&self) -> Vec<JobClass> {
        let mut classes: Vec<JobClass> = self.handlers.keys().copied().collect();
        classes.sort();
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use jobhub_core::types::JobHandle;
    use jobhub_entity::job::AnalyticsEventPayload;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl JobHandler for Echo {
        fn class(&self) -> JobClass {
            JobClass::AnalyticsEvent
        }

        async fn execute(
            &self,
            _job: &ClaimedJob,
            payload: &JobPayload,
        ) -> Result<Value, JobExecutionError> {
            Ok(serde_json::to_value(payload).map_err(AppError::from)?)
        }
    }

    fn claimed() -> ClaimedJob {
        ClaimedJob {
            handle: JobHandle::new(),
            queue: "analytics-event".to_string(),
            payload: json!({}),
            attempt: 1,
            max_attempts: 2,
            timeout: Duration::from_secs(60),
            lock_token: Uuid::new_v4(),
            lock_expires_at: Utc::now(),
        }
    }

    fn analytics() -> JobPayload {
        JobPayload::AnalyticsEvent(AnalyticsEventPayload {
            event: "signup".to_string(),
            user_id: None,
            properties: None,
            occurred_at: None,
        })
    }

    #[tokio::test]
    async fn test_dispatches_to_registered_handler() {
        let mut executor = JobExecutor::new();
        executor.register(Arc::new(Echo));
        assert!(executor.has_handler(JobClass::AnalyticsEvent));

        let result = executor.execute(&claimed(), &analytics()).await.unwrap();
        assert_eq!(result["event"], "signup");
    }

    #[tokio::test]
    async fn test_missing_handler_is_permanent() {
        let executor = JobExecutor::new();
        let err = executor.execute(&claimed(), &analytics()).await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_config_rejects_unknown_queue() {
        let mut config = WorkerConfig::default();
        config
            .executors
            .insert("fax-send".to_string(), "http://localhost:9000".to_string());
        let err = JobExecutor::from_config(&config).unwrap_err();
        assert_eq!(err.kind, jobhub_core::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_from_config_registers_delegates() {
        let mut config = WorkerConfig::default();
        config.executors.insert(
            "email-send".to_string(),
            "http://mailer.internal/run".to_string(),
        );
        config.executors.insert(
            "identity-verification".to_string(),
            "http://kyc.internal/run".to_string(),
        );
        let executor = JobExecutor::from_config(&config).unwrap();
        assert_eq!(
            executor.registered_classes(),
            vec![JobClass::IdentityVerification, JobClass::EmailSend]
        );
    }
}
