//! State of a single in-memory queue.
//!
//! All transitions take the current time as an argument so the queue itself
//! holds no clock and stays synchronous.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::types::{
    ClaimedJob, EnqueueRequest, FailOutcome, JobHandle, JobSnapshot, JobState, JobTimestamps,
    PriorityPolicy, StateCounts,
};

/// Lock held by the worker running the current attempt.
#[derive(Debug, Clone)]
struct AttemptLock {
    token: Uuid,
    worker_id: String,
    expires_at: DateTime<Utc>,
}

/// A job as stored by the broker.
#[derive(Debug, Clone)]
struct StoredJob {
    handle: JobHandle,
    queue: String,
    payload: serde_json::Value,
    policy: PriorityPolicy,
    correlation_id: Option<String>,
    state: JobState,
    progress: u8,
    result: Option<serde_json::Value>,
    failure_reason: Option<String>,
    attempts_made: u32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    next_attempt_at: Option<DateTime<Utc>>,
    lock: Option<AttemptLock>,
}

impl StoredJob {
    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            handle: self.handle,
            queue: self.queue.clone(),
            state: self.state,
            progress: self.progress,
            result: self.result.clone(),
            failure_reason: self.failure_reason.clone(),
            attempts_made: self.attempts_made,
            max_attempts: self.policy.max_attempts,
            correlation_id: self.correlation_id.clone(),
            timestamps: JobTimestamps {
                created_at: self.created_at,
                started_at: self.started_at,
                finished_at: self.finished_at,
                next_attempt_at: self.next_attempt_at,
            },
        }
    }
}

/// Jobs of one queue plus the indexes that order them.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    jobs: HashMap<JobHandle, StoredJob>,
    /// Eligible jobs ordered by (priority, sequence).
    waiting: BTreeSet<(u8, u64, JobHandle)>,
    /// Backing-off jobs ordered by (eligible at, sequence).
    delayed: BTreeSet<(DateTime<Utc>, u64, JobHandle)>,
    /// Retained terminal jobs, oldest first.
    completed: VecDeque<JobHandle>,
    failed: VecDeque<JobHandle>,
}

impl QueueState {
    /// Add a new waiting job.
    pub(crate) fn push(
        &mut self,
        handle: JobHandle,
        request: EnqueueRequest,
        seq: u64,
        now: DateTime<Utc>,
    ) {
        let job = StoredJob {
            handle,
            queue: request.queue,
            payload: request.payload,
            policy: request.policy,
            correlation_id: request.correlation_id,
            state: JobState::Waiting,
            progress: 0,
            result: None,
            failure_reason: None,
            attempts_made: 0,
            created_at: now,
            started_at: None,
            finished_at: None,
            next_attempt_at: None,
            lock: None,
        };
        self.waiting.insert((job.policy.priority, seq, handle));
        self.jobs.insert(handle, job);
    }

    pub(crate) fn snapshot(&self, handle: &JobHandle) -> Option<JobSnapshot> {
        self.jobs.get(handle).map(StoredJob::snapshot)
    }

    pub(crate) fn counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for job in self.jobs.values() {
            counts.increment(job.state);
        }
        counts
    }

    /// Move due delayed jobs back to waiting and fail attempts whose lock
    /// lapsed. Returns handles evicted by retention.
    pub(crate) fn housekeep(
        &mut self,
        now: DateTime<Utc>,
        next_seq: &mut impl FnMut() -> u64,
    ) -> Vec<JobHandle> {
        while let Some(&(at, seq, handle)) = self.delayed.first() {
            if at > now {
                break;
            }
            self.delayed.remove(&(at, seq, handle));
            if let Some(job) = self.jobs.get_mut(&handle) {
                job.state = JobState::Waiting;
                job.next_attempt_at = None;
                self.waiting.insert((job.policy.priority, next_seq(), handle));
            }
        }

        let expired: Vec<(JobHandle, Duration)> = self
            .jobs
            .values()
            .filter(|job| job.state == JobState::Active)
            .filter(|job| job.lock.as_ref().is_some_and(|lock| lock.expires_at <= now))
            .map(|job| (job.handle, job.policy.timeout))
            .collect();

        let mut evicted = Vec::new();
        for (handle, timeout) in expired {
            tracing::warn!(
                handle = %handle,
                timeout_seconds = timeout.as_secs(),
                "Job attempt timed out, releasing lock"
            );
            let reason = format!("Attempt timed out after {}s", timeout.as_secs());
            let (_, mut gone) = self.fail_attempt(&handle, &reason, true, now, next_seq());
            evicted.append(&mut gone);
        }
        evicted
    }

    /// Claim the highest-priority waiting job for one attempt.
    pub(crate) fn claim(&mut self, worker_id: &str, now: DateTime<Utc>) -> Option<ClaimedJob> {
        let (_, _, handle) = self.waiting.pop_first()?;
        let job = self.jobs.get_mut(&handle)?;

        let token = Uuid::new_v4();
        let expires_at = after(now, job.policy.timeout);
        job.state = JobState::Active;
        job.attempts_made += 1;
        job.progress = 0;
        job.started_at = Some(now);
        job.lock = Some(AttemptLock {
            token,
            worker_id: worker_id.to_string(),
            expires_at,
        });

        Some(ClaimedJob {
            handle,
            queue: job.queue.clone(),
            payload: job.payload.clone(),
            attempt: job.attempts_made,
            max_attempts: job.policy.max_attempts,
            timeout: job.policy.timeout,
            lock_token: token,
            lock_expires_at: expires_at,
        })
    }

    /// Verify that `token` holds the lock on `handle`. A lapsed lock is only
    /// accepted when `allow_lapsed` is set and no one has reclaimed the job.
    fn check_lock(
        &self,
        handle: &JobHandle,
        token: Uuid,
        now: DateTime<Utc>,
        allow_lapsed: bool,
    ) -> AppResult<()> {
        let job = self
            .jobs
            .get(handle)
            .ok_or_else(|| AppError::not_found(format!("Job {handle} not found")))?;

        match (&job.state, &job.lock) {
            (JobState::Active, Some(lock)) if lock.token == token => {
                if lock.expires_at <= now && !allow_lapsed {
                    Err(AppError::conflict(format!(
                        "Lock on job {handle} held by '{}' expired",
                        lock.worker_id
                    )))
                } else {
                    Ok(())
                }
            }
            (JobState::Active, Some(_)) => Err(AppError::conflict(format!(
                "Job {handle} is locked by another attempt"
            ))),
            (state, _) => Err(AppError::conflict(format!(
                "Job {handle} is {state}, not active"
            ))),
        }
    }

    pub(crate) fn update_progress(
        &mut self,
        handle: &JobHandle,
        token: Uuid,
        progress: u8,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if progress > 100 {
            return Err(AppError::validation(format!(
                "Progress must be between 0 and 100, got {progress}"
            )));
        }
        self.check_lock(handle, token, now, false)?;
        if let Some(job) = self.jobs.get_mut(handle) {
            job.progress = progress;
        }
        Ok(())
    }

    pub(crate) fn complete(
        &mut self,
        handle: &JobHandle,
        token: Uuid,
        result: serde_json::Value,
        now: DateTime<Utc>,
    ) -> AppResult<(JobSnapshot, Vec<JobHandle>)> {
        self.check_lock(handle, token, now, false)?;
        let job = self
            .jobs
            .get_mut(handle)
            .ok_or_else(|| AppError::not_found(format!("Job {handle} not found")))?;

        job.state = JobState::Completed;
        job.progress = 100;
        job.result = Some(result);
        job.finished_at = Some(now);
        job.lock = None;
        let snapshot = job.snapshot();
        let keep = job.policy.retention.keep_completed;

        self.completed.push_back(*handle);
        let evicted = trim(&mut self.completed, &mut self.jobs, keep);
        Ok((snapshot, evicted))
    }

    pub(crate) fn fail(
        &mut self,
        handle: &JobHandle,
        token: Uuid,
        reason: &str,
        retryable: bool,
        now: DateTime<Utc>,
        seq: u64,
    ) -> AppResult<(FailOutcome, Vec<JobHandle>)> {
        self.check_lock(handle, token, now, true)?;
        let (outcome, evicted) = self.fail_attempt(handle, reason, retryable, now, seq);
        outcome
            .map(|o| (o, evicted))
            .ok_or_else(|| AppError::not_found(format!("Job {handle} not found")))
    }

    /// Close the current attempt as failed: back off if the budget allows,
    /// otherwise move to the terminal `failed` state.
    fn fail_attempt(
        &mut self,
        handle: &JobHandle,
        reason: &str,
        retryable: bool,
        now: DateTime<Utc>,
        seq: u64,
    ) -> (Option<FailOutcome>, Vec<JobHandle>) {
        let Some(job) = self.jobs.get_mut(handle) else {
            return (None, Vec::new());
        };

        job.lock = None;
        job.failure_reason = Some(reason.to_string());

        if retryable && job.attempts_made < job.policy.max_attempts {
            let delay = job.policy.backoff.delay_for(job.attempts_made);
            let next_attempt_at = after(now, delay);
            job.state = JobState::Delayed;
            job.next_attempt_at = Some(next_attempt_at);
            self.delayed.insert((next_attempt_at, seq, *handle));
            let outcome = FailOutcome::Retrying {
                attempts_made: job.attempts_made,
                next_attempt_at,
            };
            return (Some(outcome), Vec::new());
        }

        job.state = JobState::Failed;
        job.finished_at = Some(now);
        job.next_attempt_at = None;
        let outcome = FailOutcome::Failed {
            attempts_made: job.attempts_made,
        };
        let keep = job.policy.retention.keep_failed;

        self.failed.push_back(*handle);
        let evicted = trim(&mut self.failed, &mut self.jobs, keep);
        (Some(outcome), evicted)
    }
}

/// Evict the oldest terminal jobs beyond `keep`.
fn trim(
    retained: &mut VecDeque<JobHandle>,
    jobs: &mut HashMap<JobHandle, StoredJob>,
    keep: usize,
) -> Vec<JobHandle> {
    let mut evicted = Vec::new();
    while retained.len() > keep {
        if let Some(oldest) = retained.pop_front() {
            jobs.remove(&oldest);
            evicted.push(oldest);
        }
    }
    evicted
}

/// `now + delay`, saturating at the largest representable instant.
fn after(now: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(delay)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
