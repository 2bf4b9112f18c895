//! In-memory subject store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_core::types::SubjectId;
use jobhub_entity::subject::{SubjectRecord, SubjectUpdate};

use crate::store::SubjectStore;

/// Subject records held in a concurrent map.
#[derive(Debug)]
pub struct MemorySubjectStore {
    records: DashMap<SubjectId, SubjectRecord>,
    clock: Arc<dyn Clock>,
}

impl MemorySubjectStore {
    /// Create an empty store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Apply an update in place. Never fails.
    pub(crate) fn apply_now(&self, subject_id: SubjectId, update: &SubjectUpdate) {
        let now = self.clock.now();
        self.records
            .entry(subject_id)
            .or_insert_with(|| SubjectRecord::new(subject_id))
            .apply(update, now);
    }
}

#[async_trait]
impl SubjectStore for MemorySubjectStore {
    async fn apply(&self, subject_id: SubjectId, update: SubjectUpdate) -> AppResult<()> {
        self.apply_now(subject_id, &update);
        Ok(())
    }

    async fn get(&self, subject_id: SubjectId) -> AppResult<Option<SubjectRecord>> {
        Ok(self.records.get(&subject_id).map(|r| r.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jobhub_core::traits::SystemClock;
    use jobhub_core::types::JobHandle;
    use jobhub_entity::subject::{AssetStatus, VerificationStatus};

    #[tokio::test]
    async fn test_unknown_subject_is_unverified() {
        let store = MemorySubjectStore::new(Arc::new(SystemClock));
        let subject = SubjectId::new();
        assert!(store.get(subject).await.unwrap().is_none());
        assert_eq!(
            store.verification_status(subject).await.unwrap(),
            VerificationStatus::Unverified
        );
    }

    #[tokio::test]
    async fn test_apply_creates_and_updates_record() {
        let store = MemorySubjectStore::new(Arc::new(SystemClock));
        let subject = SubjectId::new();
        let handle = JobHandle::new();

        store
            .apply(
                subject,
                SubjectUpdate::Verification {
                    status: VerificationStatus::Verified,
                    job_handle: handle,
                },
            )
            .await
            .unwrap();
        store
            .apply(
                subject,
                SubjectUpdate::MediaAsset {
                    job_handle: JobHandle::new(),
                    status: AssetStatus::Failed,
                    url: None,
                },
            )
            .await
            .unwrap();

        let record = store.get(subject).await.unwrap().unwrap();
        assert_eq!(record.verification_status, VerificationStatus::Verified);
        assert_eq!(record.verification_job, Some(handle));
        assert_eq!(record.media_assets.len(), 1);
    }
}
