//! The closed set of job classes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Class of deferred work. Each class has its own queue, payload schema and
/// priority policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobClass {
    /// Document/selfie identity check against a third-party provider.
    IdentityVerification,
    /// Image resize/transcode.
    ImageTransform,
    /// Templated transactional email.
    EmailSend,
    /// Mobile push notification.
    PushNotify,
    /// Analytics event ingestion.
    AnalyticsEvent,
}

/// Returned when a string does not name a job class.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown job class '{0}'")]
pub struct UnknownJobClass(pub String);

impl JobClass {
    /// Every job class.
    pub const ALL: [JobClass; 5] = [
        Self::IdentityVerification,
        Self::ImageTransform,
        Self::EmailSend,
        Self::PushNotify,
        Self::AnalyticsEvent,
    ];

    /// Canonical name, as used in payloads and webhook events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityVerification => "IdentityVerification",
            Self::ImageTransform => "ImageTransform",
            Self::EmailSend => "EmailSend",
            Self::PushNotify => "PushNotify",
            Self::AnalyticsEvent => "AnalyticsEvent",
        }
    }

    /// Name of the dedicated broker queue for this class.
    pub fn queue_name(&self) -> &'static str {
        match self {
            Self::IdentityVerification => "identity-verification",
            Self::ImageTransform => "image-transform",
            Self::EmailSend => "email-send",
            Self::PushNotify => "push-notify",
            Self::AnalyticsEvent => "analytics-event",
        }
    }

    /// Look up a class by its queue name.
    pub fn from_queue_name(queue: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.queue_name() == queue)
    }
}

impl fmt::Display for JobClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobClass {
    type Err = UnknownJobClass;

    /// Accepts `EmailSend`, `email-send`, `email_send` and any casing of them.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == normalized)
            .ok_or_else(|| UnknownJobClass(s.to_string()))
    }
}
