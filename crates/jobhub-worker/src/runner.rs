//! Worker runner: main loop that claims jobs and executes them.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing;
use uuid::Uuid;

use jobhub_core::config::WorkerConfig;
use jobhub_core::result::AppResult;
use jobhub_core::sanitize::for_log;
use jobhub_core::traits::JobBroker;
use jobhub_core::types::{ClaimedJob, FailOutcome};
use jobhub_entity::job::{JobClass, JobPayload};
use jobhub_entity::webhook::{CompletionStatus, WebhookEvent};
use jobhub_service::PolicyTable;

use crate::executor::{JobExecutionError, JobExecutor};
use crate::reporter::CompletionReporter;

/// Longest failure reason logged per attempt.
const LOGGED_REASON_CHARS: usize = 256;

/// Main worker runner that polls queues and executes jobs
#[derive(Debug, Clone)]
pub struct WorkerRunner {
    broker: Arc<dyn JobBroker>,
    executor: Arc<JobExecutor>,
    reporter: Option<Arc<dyn CompletionReporter>>,
    worker_id: String,
    concurrency: usize,
    poll_interval: Duration,
    /// Classes to poll, most urgent tier first.
    classes: Vec<JobClass>,
}

impl WorkerRunner {
    /// Create a new worker runner
    pub fn new(
        broker: Arc<dyn JobBroker>,
        executor: Arc<JobExecutor>,
        reporter: Option<Arc<dyn CompletionReporter>>,
        config: &WorkerConfig,
    ) -> Self {
        let worker_id = if config.worker_id.is_empty() {
            format!("worker-{}", Uuid::new_v4().simple())
        } else {
            config.worker_id.clone()
        };
        Self {
            broker,
            executor,
            reporter,
            worker_id,
            concurrency: config.concurrency.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            classes: PolicyTable::classes_by_priority(),
        }
    }

    /// Restrict polling to `classes`, keeping their priority order.
    pub fn with_classes(mut self, classes: &[JobClass]) -> Self {
        self.classes.retain(|c| classes.contains(c));
        self
    }

    /// Worker identifier recorded on claimed jobs.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// Start the worker runner; runs until the cancel signal is received,
    /// then waits up to `grace` for in-flight jobs.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>, grace: Duration) {
        tracing::info!(
            worker_id = %self.worker_id,
            concurrency = self.concurrency,
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            classes = ?self.classes,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        loop {
            if *cancel.borrow() {
                break;
            }
            let claimed = tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                    continue;
                }
                claimed = self.poll_and_spawn(&semaphore) => claimed,
            };
            if claimed {
                continue;
            }
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Worker waiting for in-flight jobs");
        let permits = u32::try_from(self.concurrency).unwrap_or(u32::MAX);
        if time::timeout(grace, semaphore.acquire_many(permits))
            .await
            .is_err()
        {
            tracing::warn!(
                worker_id = %self.worker_id,
                "Shutdown grace elapsed with jobs still running"
            );
        }
        tracing::info!(worker_id = %self.worker_id, "Worker shut down complete");
    }

    /// Claim one job if a slot is free and run it in the background.
    /// Returns whether a job was claimed.
    async fn poll_and_spawn(&self, semaphore: &Arc<Semaphore>) -> bool {
        let Ok(permit) = Arc::clone(semaphore).acquire_owned().await else {
            return false;
        };

        match self.claim().await {
            Ok(Some(job)) => {
                let runner = self.clone();
                tokio::spawn(async move {
                    let _permit = permit;
                    runner.process(job).await;
                });
                true
            }
            Ok(None) => {
                tracing::trace!("No jobs available");
                false
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim job");
                false
            }
        }
    }

    /// Claim the next job, scanning queues in priority-tier order.
    pub async fn claim(&self) -> AppResult<Option<ClaimedJob>> {
        for class in &self.classes {
            if let Some(job) = self
                .broker
                .claim_next(class.queue_name(), &self.worker_id)
                .await?
            {
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    /// Claim and fully process one job. Returns whether a job was found.
    pub async fn run_once(&self) -> AppResult<bool> {
        match self.claim().await? {
            Some(job) => {
                self.process(job).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run one attempt and record its outcome with the broker.
    async fn process(&self, job: ClaimedJob) {
        let handle = job.handle;

        let payload: JobPayload = match serde_json::from_value(job.payload.clone()) {
            Ok(payload) => payload,
            Err(e) => {
                let reason = format!("Stored payload is unreadable: {e}");
                tracing::error!(handle = %handle, "{reason}");
                self.record_failure(&job, None, &reason, false).await;
                return;
            }
        };

        tracing::info!(
            handle = %handle,
            class = %payload.class(),
            attempt = job.attempt,
            max_attempts = job.max_attempts,
            "Processing job"
        );

        let outcome = time::timeout(job.timeout, self.executor.execute(&job, &payload)).await;
        match outcome {
            Ok(Ok(result)) => match self.broker.complete(&handle, job.lock_token, result).await {
                Ok(snapshot) => {
                    tracing::info!(handle = %handle, "Job completed");
                    self.report(&payload, &job, CompletionStatus::Completed, snapshot.result, None)
                        .await;
                }
                Err(e) => {
                    tracing::error!(handle = %handle, error = %e, "Failed to mark job completed");
                }
            },
            Ok(Err(err)) => {
                let reason = match &err {
                    JobExecutionError::Permanent(msg) | JobExecutionError::Transient(msg) => {
                        msg.clone()
                    }
                    JobExecutionError::Internal(e) => e.to_string(),
                };
                self.record_failure(&job, Some(&payload), &reason, err.is_retryable())
                    .await;
            }
            Err(_) => {
                let reason = format!("Attempt timed out after {}s", job.timeout.as_secs());
                self.record_failure(&job, Some(&payload), &reason, true).await;
            }
        }
    }

    async fn record_failure(
        &self,
        job: &ClaimedJob,
        payload: Option<&JobPayload>,
        reason: &str,
        retryable: bool,
    ) {
        let handle = job.handle;
        match self
            .broker
            .fail(&handle, job.lock_token, reason, retryable)
            .await
        {
            Ok(FailOutcome::Retrying {
                attempts_made,
                next_attempt_at,
            }) => {
                tracing::warn!(
                    handle = %handle,
                    attempts_made,
                    next_attempt_at = %next_attempt_at,
                    reason = %for_log(reason, LOGGED_REASON_CHARS),
                    "Job attempt failed, retry scheduled"
                );
            }
            Ok(FailOutcome::Failed { attempts_made }) => {
                tracing::error!(
                    handle = %handle,
                    attempts_made,
                    reason = %for_log(reason, LOGGED_REASON_CHARS),
                    "Job failed permanently"
                );
                if let Some(payload) = payload {
                    let error = json!({ "message": reason });
                    self.report(payload, job, CompletionStatus::Failed, None, Some(error))
                        .await;
                }
            }
            Err(e) => {
                tracing::error!(handle = %handle, error = %e, "Failed to record job failure");
            }
        }
    }

    /// Send a completion event for a job that reached a terminal state.
    async fn report(
        &self,
        payload: &JobPayload,
        job: &ClaimedJob,
        status: CompletionStatus,
        result: Option<Value>,
        error: Option<Value>,
    ) {
        let Some(reporter) = &self.reporter else {
            return;
        };
        let Some(subject_id) = payload.subject_id() else {
            tracing::debug!(handle = %job.handle, "Job has no subject, completion not reported");
            return;
        };

        let event = WebhookEvent {
            job_handle: job.handle,
            subject_id,
            job_class: payload.class().as_str().to_string(),
            status,
            result,
            error,
        };
        if let Err(e) = reporter.report(&event).await {
            tracing::error!(handle = %job.handle, error = %e, "Failed to report completion");
        }
    }
}
