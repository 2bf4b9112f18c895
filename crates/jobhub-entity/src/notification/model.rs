//! Notification record model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobhub_core::types::{JobHandle, NotificationId, SubjectId};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    /// Identity verification outcome.
    IdentityVerification,
    /// Media processing outcome.
    Media,
    /// Email delivery outcome.
    Email,
}

impl NotificationCategory {
    /// Return the category as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityVerification => "identity_verification",
            Self::Media => "media",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "identity_verification" => Ok(Self::IdentityVerification),
            "media" => Ok(Self::Media),
            "email" => Ok(Self::Email),
            other => Err(format!("Unknown notification category '{other}'")),
        }
    }
}

/// A user-facing notification. Append-only; created only by the completion
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// Recipient.
    pub subject_id: SubjectId,
    /// Category.
    pub category: NotificationCategory,
    /// Short title.
    pub title: String,
    /// User-facing message. Never contains raw worker error detail.
    pub message: String,
    /// Job the notification is about.
    pub job_handle: Option<JobHandle>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to append a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Recipient.
    pub subject_id: SubjectId,
    /// Category.
    pub category: NotificationCategory,
    /// Short title.
    pub title: String,
    /// User-facing message.
    pub message: String,
    /// Job the notification is about.
    pub job_handle: Option<JobHandle>,
}

impl NewNotification {
    /// Materialize into a stored record.
    pub fn into_notification(self, created_at: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::new(),
            subject_id: self.subject_id,
            category: self.category,
            title: self.title,
            message: self.message,
            job_handle: self.job_handle,
            created_at,
        }
    }
}
