//! Shared domain types: typed identifiers, job lifecycle, priority policy.

pub mod id;
pub mod job;
pub mod policy;

pub use id::{JobHandle, NotificationId, SubjectId};
pub use job::{
    ClaimedJob, EnqueueRequest, FailOutcome, JobSnapshot, JobState, JobTimestamps, StateCounts,
};
pub use policy::{Backoff, PriorityPolicy, PriorityTier, Retention};
