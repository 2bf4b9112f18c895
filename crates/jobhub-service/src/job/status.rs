//! Status lookups and queue statistics. Read-only.

use std::sync::Arc;

use serde::Serialize;

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::traits::JobBroker;
use jobhub_core::types::{JobHandle, JobSnapshot, PriorityTier, StateCounts};
use jobhub_entity::job::JobClass;

use crate::policy::PolicyTable;

/// Counts for one class queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    /// Job class.
    pub job_class: JobClass,
    /// Queue name.
    pub queue: String,
    /// Policy tier of the class.
    pub tier: PriorityTier,
    /// Jobs per lifecycle state.
    pub counts: StateCounts,
}

/// Counts across every class queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    /// Per-class counts, most urgent tier first.
    pub classes: Vec<ClassStats>,
    /// Sum over all classes.
    pub totals: StateCounts,
}

/// Resolves job handles to broker state.
#[derive(Debug, Clone)]
pub struct StatusService {
    broker: Arc<dyn JobBroker>,
}

impl StatusService {
    /// Create a new status service.
    pub fn new(broker: Arc<dyn JobBroker>) -> Self {
        Self { broker }
    }

    /// Look up a job by handle across every class queue.
    ///
    /// A string that is not a well-formed handle is reported as not found.
    pub async fn get_status(&self, handle: &str) -> AppResult<JobSnapshot> {
        let not_found = || AppError::not_found(format!("Job '{}' not found", handle.trim()));
        let handle: JobHandle = handle.trim().parse().map_err(|_| not_found())?;

        for class in JobClass::ALL {
            if let Some(snapshot) = self.broker.find(class.queue_name(), &handle).await? {
                return Ok(snapshot);
            }
        }
        Err(not_found())
    }

    /// Counts by lifecycle state for every class queue.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let mut classes = Vec::with_capacity(JobClass::ALL.len());
        let mut totals = StateCounts::default();

        for class in PolicyTable::classes_by_priority() {
            let counts = self.broker.counts(class.queue_name()).await?;
            totals += counts;
            classes.push(ClassStats {
                job_class: class,
                queue: class.queue_name().to_string(),
                tier: PolicyTable::tier_for(class),
                counts,
            });
        }
        Ok(QueueStats { classes, totals })
    }
}
