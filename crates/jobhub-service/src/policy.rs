//! Job class → priority policy table.
//!
//! The only place retry counts, backoff and timeouts are chosen. Submission
//! attaches the policy to the job; the broker and workers read it from there.

use jobhub_core::types::{PriorityPolicy, PriorityTier};
use jobhub_entity::job::JobClass;

/// Static lookup from job class to scheduling policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyTable;

impl PolicyTable {
    /// Tier assigned to a class.
    pub const fn tier_for(class: JobClass) -> PriorityTier {
        match class {
            JobClass::PushNotify => PriorityTier::Critical,
            JobClass::IdentityVerification => PriorityTier::High,
            JobClass::ImageTransform | JobClass::EmailSend => PriorityTier::Normal,
            JobClass::AnalyticsEvent => PriorityTier::Low,
        }
    }

    /// Full policy for a class.
    pub const fn policy_for(class: JobClass) -> PriorityPolicy {
        Self::tier_for(class).policy()
    }

    /// Every class, most urgent tier first. Used as the worker poll order.
    pub fn classes_by_priority() -> Vec<JobClass> {
        let mut classes = JobClass::ALL.to_vec();
        classes.sort_by_key(|c| Self::policy_for(*c).priority);
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use jobhub_core::types::Backoff;

    #[test]
    fn test_class_mapping() {
        assert_eq!(PolicyTable::tier_for(JobClass::PushNotify), PriorityTier::Critical);
        assert_eq!(
            PolicyTable::tier_for(JobClass::IdentityVerification),
            PriorityTier::High
        );
        assert_eq!(PolicyTable::tier_for(JobClass::EmailSend), PriorityTier::Normal);
        assert_eq!(PolicyTable::tier_for(JobClass::ImageTransform), PriorityTier::Normal);
        assert_eq!(PolicyTable::tier_for(JobClass::AnalyticsEvent), PriorityTier::Low);
    }

    #[test]
    fn test_identity_verification_policy() {
        let policy = PolicyTable::policy_for(JobClass::IdentityVerification);
        assert_eq!(policy.priority, 3);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, Backoff::exponential(Duration::from_secs(60)));
        assert_eq!(policy.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_poll_order() {
        let order = PolicyTable::classes_by_priority();
        assert_eq!(order.first(), Some(&JobClass::PushNotify));
        assert_eq!(order.get(1), Some(&JobClass::IdentityVerification));
        assert_eq!(order.last(), Some(&JobClass::AnalyticsEvent));
    }
}
