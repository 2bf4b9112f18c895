//! Notification creation and listing.

use std::sync::Arc;

use tracing::info;

use jobhub_core::result::AppResult;
use jobhub_core::sanitize::strip_control_chars;
use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_database::store::{CompletionRecord, CompletionStore, NotificationStore};
use jobhub_entity::notification::{NewNotification, Notification};
use jobhub_entity::subject::SubjectUpdate;

/// Writes and reads the append-only notification log.
///
/// Notifications are only created together with the subject update of the
/// job they describe.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
    completions: Arc<dyn CompletionStore>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>, completions: Arc<dyn CompletionStore>) -> Self {
        Self { store, completions }
    }

    /// Record a finished job: apply `update` and append `notification` as
    /// one write. Title and message are stripped of control characters
    /// before they are stored.
    pub async fn record_completion(
        &self,
        job_handle: JobHandle,
        update: SubjectUpdate,
        notification: NewNotification,
    ) -> AppResult<CompletionRecord> {
        let subject_id = notification.subject_id;
        let notification = NewNotification {
            title: strip_control_chars(&notification.title),
            message: strip_control_chars(&notification.message),
            job_handle: Some(job_handle),
            ..notification
        };

        let recorded = self
            .completions
            .record_completion(subject_id, job_handle, update, notification)
            .await?;
        if recorded.newly_recorded {
            info!(
                notification_id = %recorded.notification.id,
                category = %recorded.notification.category,
                "Notification created"
            );
        }
        Ok(recorded)
    }

    /// Notifications of a subject, oldest first.
    pub async fn list_for_subject(&self, subject_id: SubjectId) -> AppResult<Vec<Notification>> {
        self.store.list_for_subject(subject_id).await
    }

    /// Number of notifications of a subject.
    pub async fn count_for_subject(&self, subject_id: SubjectId) -> AppResult<u64> {
        self.store.count_for_subject(subject_id).await
    }
}
