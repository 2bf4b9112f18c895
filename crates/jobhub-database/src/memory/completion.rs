//! In-memory completion store.
//!
//! The notification is appended first and the subject update applied only
//! once it is stored. The in-memory subject update cannot fail, so a failed
//! append leaves nothing behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use jobhub_core::result::AppResult;
use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_entity::notification::{NewNotification, Notification};
use jobhub_entity::subject::SubjectUpdate;

use super::subject::MemorySubjectStore;
use crate::store::{CompletionRecord, CompletionStore, NotificationStore};

/// Writes completions into a [`MemorySubjectStore`] and a notification log.
#[derive(Debug)]
pub struct MemoryCompletionStore {
    subjects: Arc<MemorySubjectStore>,
    notifications: Arc<dyn NotificationStore>,
    /// Jobs already recorded. Held across the whole write so concurrent
    /// deliveries of one job serialize.
    recorded: Mutex<HashMap<(SubjectId, JobHandle), Notification>>,
}

impl MemoryCompletionStore {
    /// Create a store writing into `subjects` and `notifications`.
    pub fn new(subjects: Arc<MemorySubjectStore>, notifications: Arc<dyn NotificationStore>) -> Self {
        Self {
            subjects,
            notifications,
            recorded: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CompletionStore for MemoryCompletionStore {
    async fn record_completion(
        &self,
        subject_id: SubjectId,
        job_handle: JobHandle,
        update: SubjectUpdate,
        notification: NewNotification,
    ) -> AppResult<CompletionRecord> {
        let mut recorded = self.recorded.lock().await;
        if let Some(existing) = recorded.get(&(subject_id, job_handle)) {
            return Ok(CompletionRecord {
                notification: existing.clone(),
                newly_recorded: false,
            });
        }

        let notification = self.notifications.append(notification).await?;
        self.subjects.apply_now(subject_id, &update);
        recorded.insert((subject_id, job_handle), notification.clone());

        Ok(CompletionRecord {
            notification,
            newly_recorded: true,
        })
    }
}
