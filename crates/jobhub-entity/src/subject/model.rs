//! Subject record and the updates the completion dispatcher may apply.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use jobhub_core::types::{JobHandle, SubjectId};

/// Identity verification status of a subject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// No verification attempted.
    #[default]
    Unverified,
    /// A verification job is in flight.
    Pending,
    /// Verified.
    Verified,
    /// The last verification attempt failed.
    Failed,
}

impl VerificationStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unverified" => Ok(Self::Unverified),
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown verification status '{other}'")),
        }
    }
}

/// Outcome of an image processing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    /// The processed asset is available.
    Ready,
    /// Processing failed.
    Failed,
}

impl AssetStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for AssetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown asset status '{other}'")),
        }
    }
}

/// Outcome of an email job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted by the mail provider.
    Delivered,
    /// Delivery failed.
    Failed,
}

impl DeliveryStatus {
    /// Return the status as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delivered" => Ok(Self::Delivered),
            "failed" => Ok(Self::Failed),
            other => Err(format!("Unknown delivery status '{other}'")),
        }
    }
}

/// A processed media asset recorded against a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAsset {
    /// Job that produced the asset.
    pub job_handle: JobHandle,
    /// Outcome.
    pub status: AssetStatus,
    /// Location of the processed asset.
    pub url: Option<String>,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// An email delivery outcome recorded against a subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDelivery {
    /// Job that sent the email.
    pub job_handle: JobHandle,
    /// Outcome.
    pub status: DeliveryStatus,
    /// When the outcome was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Durable state kept per subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRecord {
    /// Subject identifier.
    pub subject_id: SubjectId,
    /// Current verification status.
    pub verification_status: VerificationStatus,
    /// Job that last changed the verification status.
    pub verification_job: Option<JobHandle>,
    /// When the verification status last changed.
    pub verification_updated_at: Option<DateTime<Utc>>,
    /// Media processing outcomes.
    pub media_assets: Vec<MediaAsset>,
    /// Email delivery outcomes.
    pub email_deliveries: Vec<EmailDelivery>,
}

impl SubjectRecord {
    /// A subject with no recorded state.
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            verification_status: VerificationStatus::Unverified,
            verification_job: None,
            verification_updated_at: None,
            media_assets: Vec::new(),
            email_deliveries: Vec::new(),
        }
    }

    /// Apply one update in place.
    pub fn apply(&mut self, update: &SubjectUpdate, at: DateTime<Utc>) {
        match update {
            SubjectUpdate::Verification { status, job_handle } => {
                self.verification_status = *status;
                self.verification_job = Some(*job_handle);
                self.verification_updated_at = Some(at);
            }
            SubjectUpdate::MediaAsset {
                job_handle,
                status,
                url,
            } => {
                let asset = MediaAsset {
                    job_handle: *job_handle,
                    status: *status,
                    url: url.clone(),
                    recorded_at: at,
                };
                match self
                    .media_assets
                    .iter_mut()
                    .find(|a| a.job_handle == *job_handle)
                {
                    Some(existing) => *existing = asset,
                    None => self.media_assets.push(asset),
                }
            }
            SubjectUpdate::EmailDelivery { job_handle, status } => {
                let delivery = EmailDelivery {
                    job_handle: *job_handle,
                    status: *status,
                    recorded_at: at,
                };
                match self
                    .email_deliveries
                    .iter_mut()
                    .find(|d| d.job_handle == *job_handle)
                {
                    Some(existing) => *existing = delivery,
                    None => self.email_deliveries.push(delivery),
                }
            }
        }
    }
}

/// A single durable state change scoped to one subject.
///
/// Media and email outcomes are keyed by job handle: applying the update for
/// the same job again replaces the earlier outcome instead of adding one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubjectUpdate {
    /// Set the identity verification status.
    Verification {
        /// New status.
        status: VerificationStatus,
        /// Job that produced it.
        job_handle: JobHandle,
    },
    /// Record a media processing outcome.
    MediaAsset {
        /// Job that produced it.
        job_handle: JobHandle,
        /// Outcome.
        status: AssetStatus,
        /// Location of the processed asset.
        url: Option<String>,
    },
    /// Record an email delivery outcome.
    EmailDelivery {
        /// Job that produced it.
        job_handle: JobHandle,
        /// Outcome.
        status: DeliveryStatus,
    },
}

impl SubjectUpdate {
    /// Job the update came from.
    pub fn job_handle(&self) -> JobHandle {
        match self {
            Self::Verification { job_handle, .. }
            | Self::MediaAsset { job_handle, .. }
            | Self::EmailDelivery { job_handle, .. } => *job_handle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_verification_update() {
        let subject = SubjectId::new();
        let handle = JobHandle::new();
        let now = Utc::now();
        let mut record = SubjectRecord::new(subject);

        record.apply(
            &SubjectUpdate::Verification {
                status: VerificationStatus::Failed,
                job_handle: handle,
            },
            now,
        );

        assert_eq!(record.verification_status, VerificationStatus::Failed);
        assert_eq!(record.verification_job, Some(handle));
        assert_eq!(record.verification_updated_at, Some(now));
        assert!(record.media_assets.is_empty());
    }

    #[test]
    fn test_apply_appends_media_and_email() {
        let mut record = SubjectRecord::new(SubjectId::new());
        let now = Utc::now();
        record.apply(
            &SubjectUpdate::MediaAsset {
                job_handle: JobHandle::new(),
                status: AssetStatus::Ready,
                url: Some("https://cdn.example.com/a.webp".into()),
            },
            now,
        );
        record.apply(
            &SubjectUpdate::EmailDelivery {
                job_handle: JobHandle::new(),
                status: DeliveryStatus::Delivered,
            },
            now,
        );
        assert_eq!(record.media_assets.len(), 1);
        assert_eq!(record.email_deliveries.len(), 1);
        assert_eq!(record.verification_status, VerificationStatus::Unverified);
    }

    #[test]
    fn test_reapplying_same_job_replaces_outcome() {
        let mut record = SubjectRecord::new(SubjectId::new());
        let handle = JobHandle::new();
        let now = Utc::now();

        for status in [DeliveryStatus::Failed, DeliveryStatus::Delivered] {
            record.apply(
                &SubjectUpdate::EmailDelivery {
                    job_handle: handle,
                    status,
                },
                now,
            );
        }
        record.apply(
            &SubjectUpdate::EmailDelivery {
                job_handle: JobHandle::new(),
                status: DeliveryStatus::Failed,
            },
            now,
        );

        assert_eq!(record.email_deliveries.len(), 2);
        assert_eq!(record.email_deliveries[0].job_handle, handle);
        assert_eq!(record.email_deliveries[0].status, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_verification_status_round_trip() {
        for status in [
            VerificationStatus::Unverified,
            VerificationStatus::Pending,
            VerificationStatus::Verified,
            VerificationStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<VerificationStatus>(), Ok(status));
        }
    }
}
