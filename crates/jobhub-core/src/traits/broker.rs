//! Job broker port.
//!
//! The broker is the only shared mutable resource in the system. It owns job
//! state, attempt counting, backoff timers and the per-attempt lock, so the
//! API processes and the worker fleet stay stateless.

use async_trait::async_trait;
use uuid::Uuid;

use crate::result::AppResult;
use crate::types::{ClaimedJob, EnqueueRequest, FailOutcome, JobHandle, JobSnapshot, StateCounts};

/// Durable queue backend.
///
/// Within one queue jobs are served by ascending policy priority, FIFO among
/// equal priorities. There is no ordering across queues.
#[async_trait]
pub trait JobBroker: Send + Sync + std::fmt::Debug + 'static {
    /// Place a job in its queue and assign a handle. The job starts `waiting`.
    async fn enqueue(&self, request: EnqueueRequest) -> AppResult<JobHandle>;

    /// Look up a job in one queue. Returns `None` if the queue does not hold it.
    async fn find(&self, queue: &str, handle: &JobHandle) -> AppResult<Option<JobSnapshot>>;

    /// Count jobs in each lifecycle state for one queue.
    async fn counts(&self, queue: &str) -> AppResult<StateCounts>;

    /// Claim the next eligible job of a queue for one attempt.
    ///
    /// Before selecting, due delayed jobs become waiting again and attempts
    /// whose lock lapsed are failed as timed out.
    async fn claim_next(&self, queue: &str, worker_id: &str) -> AppResult<Option<ClaimedJob>>;

    /// Record progress (0–100) for an active attempt.
    async fn update_progress(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        progress: u8,
    ) -> AppResult<()>;

    /// Finish an active attempt successfully.
    async fn complete(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        result: serde_json::Value,
    ) -> AppResult<JobSnapshot>;

    /// Finish an active attempt with a failure.
    ///
    /// A retryable failure within the attempt budget delays the job by the
    /// policy's backoff; otherwise the job becomes terminally failed.
    async fn fail(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        reason: &str,
        retryable: bool,
    ) -> AppResult<FailOutcome>;

    /// Check that the broker backend is reachable.
    async fn health_check(&self) -> AppResult<bool>;
}
