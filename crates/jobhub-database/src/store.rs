//! Store ports used by the completion dispatcher and the read paths.

use async_trait::async_trait;

use jobhub_core::result::AppResult;
use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_entity::notification::{NewNotification, Notification};
use jobhub_entity::subject::{SubjectRecord, SubjectUpdate, VerificationStatus};

/// Per-subject durable state.
#[async_trait]
pub trait SubjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Apply one update, creating the subject record if needed.
    async fn apply(&self, subject_id: SubjectId, update: SubjectUpdate) -> AppResult<()>;

    /// Fetch a subject record. `None` if nothing was ever recorded.
    async fn get(&self, subject_id: SubjectId) -> AppResult<Option<SubjectRecord>>;

    /// Current verification status; `unverified` for unknown subjects.
    async fn verification_status(&self, subject_id: SubjectId) -> AppResult<VerificationStatus> {
        Ok(self
            .get(subject_id)
            .await?
            .map(|record| record.verification_status)
            .unwrap_or_default())
    }
}

/// Append-only notification log.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug + 'static {
    /// Append a notification and return the stored record.
    async fn append(&self, notification: NewNotification) -> AppResult<Notification>;

    /// All notifications for a subject, oldest first.
    async fn list_for_subject(&self, subject_id: SubjectId) -> AppResult<Vec<Notification>>;

    /// Number of notifications for a subject.
    async fn count_for_subject(&self, subject_id: SubjectId) -> AppResult<u64>;
}

/// Outcome of [`CompletionStore::record_completion`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRecord {
    /// The job's notification, created now or by an earlier delivery.
    pub notification: Notification,
    /// `false` when the job was already recorded and nothing was written.
    pub newly_recorded: bool,
}

/// Records the outcome of a finished job: one subject update plus one
/// notification, written together or not at all.
#[async_trait]
pub trait CompletionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Apply `update` and append `notification` for `job_handle`.
    ///
    /// A job is recorded at most once per subject. Repeating the call for a
    /// recorded job returns the stored notification and changes nothing.
    async fn record_completion(
        &self,
        subject_id: SubjectId,
        job_handle: JobHandle,
        update: SubjectUpdate,
        notification: NewNotification,
    ) -> AppResult<CompletionRecord>;
}
