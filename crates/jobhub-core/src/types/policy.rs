//! Priority policy types: attempt budget, backoff, timeout, retention.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay strategy between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Backoff {
    /// `base × 2^(n−1)` after the n-th failed attempt.
    Exponential {
        /// Delay after the first failure.
        base: Duration,
    },
    /// The same delay after every failure.
    Fixed {
        /// Delay between attempts.
        delay: Duration,
    },
}

impl Backoff {
    /// Exponential backoff starting at `base`.
    pub const fn exponential(base: Duration) -> Self {
        Self::Exponential { base }
    }

    /// Fixed backoff of `delay`.
    pub const fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }

    /// Delay to wait after `attempts_made` attempts have failed.
    ///
    /// `attempts_made` is 1-based; zero is treated as one.
    pub fn delay_for(&self, attempts_made: u32) -> Duration {
        match *self {
            Self::Exponential { base } => {
                let exponent = attempts_made.max(1) - 1;
                let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
                base.saturating_mul(factor)
            }
            Self::Fixed { delay } => delay,
        }
    }
}

/// How many terminal jobs of a class are kept for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retention {
    /// Completed jobs kept before the oldest is evicted.
    pub keep_completed: usize,
    /// Failed jobs kept before the oldest is evicted.
    pub keep_failed: usize,
}

/// Named policy tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    /// Served first, largest attempt budget.
    Critical,
    /// User-facing work that should not wait behind bulk traffic.
    High,
    /// Default tier.
    Normal,
    /// Bulk/background traffic.
    Low,
}

impl PriorityTier {
    /// All tiers, most urgent first.
    pub const ALL: [PriorityTier; 4] = [Self::Critical, Self::High, Self::Normal, Self::Low];

    /// The policy attached to this tier.
    pub const fn policy(self) -> PriorityPolicy {
        match self {
            Self::Critical => PriorityPolicy {
                tier: self,
                priority: 1,
                max_attempts: 5,
                backoff: Backoff::exponential(Duration::from_secs(10)),
                timeout: Duration::from_secs(120),
                retention: Retention {
                    keep_completed: 100,
                    keep_failed: 1000,
                },
            },
            Self::High => PriorityPolicy {
                tier: self,
                priority: 3,
                max_attempts: 3,
                backoff: Backoff::exponential(Duration::from_secs(60)),
                timeout: Duration::from_secs(60),
                retention: Retention {
                    keep_completed: 100,
                    keep_failed: 500,
                },
            },
            Self::Normal => PriorityPolicy {
                tier: self,
                priority: 5,
                max_attempts: 3,
                backoff: Backoff::fixed(Duration::from_secs(120)),
                timeout: Duration::from_secs(30),
                retention: Retention {
                    keep_completed: 100,
                    keep_failed: 200,
                },
            },
            Self::Low => PriorityPolicy {
                tier: self,
                priority: 8,
                max_attempts: 2,
                backoff: Backoff::fixed(Duration::from_secs(300)),
                timeout: Duration::from_secs(60),
                retention: Retention {
                    keep_completed: 20,
                    keep_failed: 50,
                },
            },
        }
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scheduling policy attached to every job at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityPolicy {
    /// Tier this policy was derived from.
    pub tier: PriorityTier,
    /// Lower numbers are served first; ties are FIFO.
    pub priority: u8,
    /// Total attempts before the job becomes terminally failed.
    pub max_attempts: u32,
    /// Delay strategy between attempts.
    pub backoff: Backoff,
    /// Per-attempt execution timeout (lock lifetime).
    pub timeout: Duration,
    /// Terminal job retention.
    pub retention: Retention,
}
