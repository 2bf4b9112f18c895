//! In-memory notification log.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_core::types::SubjectId;
use jobhub_entity::notification::{NewNotification, Notification};

use crate::store::NotificationStore;

/// Notifications grouped per subject, in append order.
#[derive(Debug)]
pub struct MemoryNotificationStore {
    by_subject: DashMap<SubjectId, Vec<Notification>>,
    clock: Arc<dyn Clock>,
}

impl MemoryNotificationStore {
    /// Create an empty log.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            by_subject: DashMap::new(),
            clock,
        }
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn append(&self, notification: NewNotification) -> AppResult<Notification> {
        let record = notification.into_notification(self.clock.now());
        debug!(
            notification_id = %record.id,
            subject_id = %record.subject_id,
            category = %record.category,
            "Notification appended"
        );
        self.by_subject
            .entry(record.subject_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn list_for_subject(&self, subject_id: SubjectId) -> AppResult<Vec<Notification>> {
        Ok(self
            .by_subject
            .get(&subject_id)
            .map(|list| list.value().clone())
            .unwrap_or_default())
    }

    async fn count_for_subject(&self, subject_id: SubjectId) -> AppResult<u64> {
        Ok(self
            .by_subject
            .get(&subject_id)
            .map(|list| list.len() as u64)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jobhub_core::traits::SystemClock;
    use jobhub_entity::notification::NotificationCategory;

    fn notification(subject_id: SubjectId, title: &str) -> NewNotification {
        NewNotification {
            subject_id,
            category: NotificationCategory::Email,
            title: title.to_string(),
            message: "Your email was sent".to_string(),
            job_handle: None,
        }
    }

    #[tokio::test]
    async fn test_append_keeps_order_per_subject() {
        let store = MemoryNotificationStore::new(Arc::new(SystemClock));
        let alice = SubjectId::new();
        let bob = SubjectId::new();

        store.append(notification(alice, "first")).await.unwrap();
        store.append(notification(bob, "other")).await.unwrap();
        store.append(notification(alice, "second")).await.unwrap();

        let titles: Vec<String> = store
            .list_for_subject(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert_eq!(store.count_for_subject(bob).await.unwrap(), 1);
        assert_eq!(store.count_for_subject(SubjectId::new()).await.unwrap(), 0);
    }
}
