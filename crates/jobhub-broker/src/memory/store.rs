//! In-memory [`JobBroker`] implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::traits::{Clock, JobBroker};
use jobhub_core::types::{
    ClaimedJob, EnqueueRequest, FailOutcome, JobHandle, JobSnapshot, StateCounts,
};

use super::queue::QueueState;

#[derive(Debug, Default)]
struct BrokerInner {
    queues: HashMap<String, QueueState>,
    /// Which queue holds each live job.
    index: HashMap<JobHandle, String>,
    /// Global insertion sequence, used for FIFO ordering.
    next_seq: u64,
}

impl BrokerInner {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn forget(&mut self, evicted: Vec<JobHandle>) {
        for handle in evicted {
            debug!(handle = %handle, "Evicted job past retention");
            self.index.remove(&handle);
        }
    }

    /// Resolve the queue of a live job.
    fn queue_of(&mut self, handle: &JobHandle) -> AppResult<&mut QueueState> {
        let name = self
            .index
            .get(handle)
            .ok_or_else(|| AppError::not_found(format!("Job {handle} not found")))?;
        self.queues
            .get_mut(name)
            .ok_or_else(|| AppError::internal(format!("Queue '{name}' missing for job {handle}")))
    }
}

/// Single-process broker. All queues live behind one async mutex.
#[derive(Debug)]
pub struct MemoryBroker {
    inner: Mutex<BrokerInner>,
    clock: Arc<dyn Clock>,
}

impl MemoryBroker {
    /// Create an empty broker driven by `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(BrokerInner::default()),
            clock,
        }
    }
}

#[async_trait]
impl JobBroker for MemoryBroker {
    async fn enqueue(&self, request: EnqueueRequest) -> AppResult<JobHandle> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;

        let handle = JobHandle::new();
        let seq = inner.seq();
        let queue = request.queue.clone();
        inner
            .queues
            .entry(queue.clone())
            .or_default()
            .push(handle, request, seq, now);
        inner.index.insert(handle, queue.clone());

        debug!(handle = %handle, queue = %queue, "Job enqueued");
        Ok(handle)
    }

    async fn find(&self, queue: &str, handle: &JobHandle) -> AppResult<Option<JobSnapshot>> {
        let inner = self.inner.lock().await;
        Ok(inner.queues.get(queue).and_then(|q| q.snapshot(handle)))
    }

    async fn counts(&self, queue: &str) -> AppResult<StateCounts> {
        let inner = self.inner.lock().await;
        Ok(inner
            .queues
            .get(queue)
            .map(QueueState::counts)
            .unwrap_or_default())
    }

    async fn claim_next(&self, queue: &str, worker_id: &str) -> AppResult<Option<ClaimedJob>> {
        let now = self.clock.now();
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let Some(state) = inner.queues.get_mut(queue) else {
            return Ok(None);
        };
        let next_seq = &mut inner.next_seq;
        let evicted = state.housekeep(now, &mut || {
            *next_seq += 1;
            *next_seq
        });
        let claimed = state.claim(worker_id, now);
        inner.forget(evicted);

        if let Some(job) = &claimed {
            info!(
                handle = %job.handle,
                queue = %queue,
                worker_id = %worker_id,
                attempt = job.attempt,
                max_attempts = job.max_attempts,
                "Job claimed"
            );
        }
        Ok(claimed)
    }

    async fn update_progress(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        progress: u8,
    ) -> AppResult<()> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        inner
            .queue_of(handle)?
            .update_progress(handle, lock_token, progress, now)
    }

    async fn complete(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        result: serde_json::Value,
    ) -> AppResult<JobSnapshot> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        let (snapshot, evicted) = inner
            .queue_of(handle)?
            .complete(handle, lock_token, result, now)?;
        inner.forget(evicted);

        info!(handle = %handle, attempts = snapshot.attempts_made, "Job completed");
        Ok(snapshot)
    }

    async fn fail(
        &self,
        handle: &JobHandle,
        lock_token: Uuid,
        reason: &str,
        retryable: bool,
    ) -> AppResult<FailOutcome> {
        let now = self.clock.now();
        let mut inner = self.inner.lock().await;
        let seq = inner.seq();
        let (outcome, evicted) = inner
            .queue_of(handle)?
            .fail(handle, lock_token, reason, retryable, now, seq)?;
        inner.forget(evicted);

        match outcome {
            FailOutcome::Retrying {
                attempts_made,
                next_attempt_at,
            } => info!(
                handle = %handle,
                attempts_made,
                next_attempt_at = %next_attempt_at,
                "Job attempt failed, retry scheduled"
            ),
            FailOutcome::Failed { attempts_made } => info!(
                handle = %handle,
                attempts_made,
                retryable,
                "Job failed permanently"
            ),
        }
        Ok(outcome)
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
