//! Job lifecycle types shared by the broker port and its callers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::id::JobHandle;
use super::policy::PriorityPolicy;

/// Lifecycle state of a job, as recorded by the broker.
///
/// `waiting → active → {completed | failed}`, with `active → delayed → active`
/// for every retried attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Queued and eligible to be claimed.
    Waiting,
    /// Held by exactly one worker.
    Active,
    /// Failed an attempt and waiting out its backoff.
    Delayed,
    /// Finished successfully.
    Completed,
    /// Exhausted its attempts or failed permanently.
    Failed,
}

impl JobState {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Delayed => "delayed",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle timestamps of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTimestamps {
    /// When the job was enqueued.
    pub created_at: DateTime<Utc>,
    /// When the most recent attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
    /// When a delayed job becomes eligible again.
    pub next_attempt_at: Option<DateTime<Utc>>,
}

/// Read-only projection of a job's broker state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Job handle.
    pub handle: JobHandle,
    /// Queue the job lives in.
    pub queue: String,
    /// Current lifecycle state.
    pub state: JobState,
    /// Progress reported by the worker, 0–100.
    pub progress: u8,
    /// Result recorded on completion.
    pub result: Option<serde_json::Value>,
    /// Reason recorded for the latest failed attempt.
    pub failure_reason: Option<String>,
    /// Number of attempts started so far.
    pub attempts_made: u32,
    /// Attempt budget from the job's policy.
    pub max_attempts: u32,
    /// Caller-supplied correlation id.
    pub correlation_id: Option<String>,
    /// Lifecycle timestamps.
    pub timestamps: JobTimestamps,
}

/// Number of jobs in each lifecycle state for one queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    /// Jobs waiting to be claimed.
    pub waiting: u64,
    /// Jobs held by a worker.
    pub active: u64,
    /// Jobs waiting out a backoff delay.
    pub delayed: u64,
    /// Retained completed jobs.
    pub completed: u64,
    /// Retained failed jobs.
    pub failed: u64,
}

impl StateCounts {
    /// Sum across all states.
    pub fn total(&self) -> u64 {
        self.waiting + self.active + self.delayed + self.completed + self.failed
    }

    /// Record one job in `state`.
    pub fn increment(&mut self, state: JobState) {
        match state {
            JobState::Waiting => self.waiting += 1,
            JobState::Active => self.active += 1,
            JobState::Delayed => self.delayed += 1,
            JobState::Completed => self.completed += 1,
            JobState::Failed => self.failed += 1,
        }
    }
}

impl std::ops::AddAssign for StateCounts {
    fn add_assign(&mut self, other: Self) {
        self.waiting += other.waiting;
        self.active += other.active;
        self.delayed += other.delayed;
        self.completed += other.completed;
        self.failed += other.failed;
    }
}

/// A validated job ready to be placed in a queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnqueueRequest {
    /// Destination queue (one per job class).
    pub queue: String,
    /// Normalized job payload.
    pub payload: serde_json::Value,
    /// Scheduling policy for the job's class.
    pub policy: PriorityPolicy,
    /// Caller-supplied correlation id.
    pub correlation_id: Option<String>,
}

/// A job claimed by a worker for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimedJob {
    /// Job handle.
    pub handle: JobHandle,
    /// Queue the job was claimed from.
    pub queue: String,
    /// Normalized job payload.
    pub payload: serde_json::Value,
    /// 1-based number of this attempt.
    pub attempt: u32,
    /// Attempt budget.
    pub max_attempts: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Token proving ownership of the lock for this attempt.
    pub lock_token: Uuid,
    /// When the lock lapses and the attempt is considered timed out.
    pub lock_expires_at: DateTime<Utc>,
}

/// What happened to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailOutcome {
    /// The job was delayed and will be attempted again.
    Retrying {
        /// Attempts made so far.
        attempts_made: u32,
        /// When the job becomes eligible again.
        next_attempt_at: DateTime<Utc>,
    },
    /// The job is terminally failed.
    Failed {
        /// Attempts made in total.
        attempts_made: u32,
    },
}

impl FailOutcome {
    /// Whether the job reached its terminal `failed` state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
