//! Typed, validated payloads for each job class.
//!
//! These are the normalized forms produced by the schema registry. They are
//! what the broker stores and what workers receive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use jobhub_core::types::SubjectId;

use super::class::JobClass;

/// Identity document kinds accepted for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Passport.
    Passport,
    /// Government-issued national identity card.
    NationalId,
    /// Driver's license.
    DriversLicense,
    /// Residence permit.
    ResidencePermit,
}

impl DocumentType {
    /// Wire names of every document type.
    pub const NAMES: &'static [&'static str] = &[
        "passport",
        "national_id",
        "drivers_license",
        "residence_permit",
    ];
}

/// Output formats for image transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG.
    Jpeg,
    /// PNG.
    Png,
    /// WebP.
    Webp,
    /// AVIF.
    Avif,
}

impl ImageFormat {
    /// Wire names of every format.
    pub const NAMES: &'static [&'static str] = &["jpeg", "png", "webp", "avif"];
}

/// Identity verification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityVerificationPayload {
    /// Subject being verified.
    pub user_id: SubjectId,
    /// Kind of document presented.
    pub document_type: DocumentType,
    /// Document number as printed.
    pub document_number: String,
    /// URLs of the document images (at least one).
    pub image_urls: Vec<String>,
    /// Optional selfie for liveness matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selfie_url: Option<String>,
}

/// Image transform request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageTransformPayload {
    /// Owner of the image, notified on completion.
    pub owner_id: SubjectId,
    /// Source image URL.
    pub image_url: String,
    /// Output format.
    pub format: ImageFormat,
    /// Target width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Target height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Encoder quality, 1–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
}

/// Templated email request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSendPayload {
    /// Recipient address.
    pub to: String,
    /// Template identifier.
    pub template: String,
    /// Template variables.
    pub data: Map<String, Value>,
    /// Subject to notify about delivery, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<SubjectId>,
}

/// Push notification request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotifyPayload {
    /// Recipient.
    pub user_id: SubjectId,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Extra data delivered with the push.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

/// Analytics event ingestion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEventPayload {
    /// Event name.
    pub event: String,
    /// Acting user, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<SubjectId>,
    /// Event properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// When the event happened on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Class-tagged job payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "jobClass")]
pub enum JobPayload {
    /// Identity verification.
    IdentityVerification(IdentityVerificationPayload),
    /// Image transform.
    ImageTransform(ImageTransformPayload),
    /// Email send.
    EmailSend(EmailSendPayload),
    /// Push notification.
    PushNotify(PushNotifyPayload),
    /// Analytics event.
    AnalyticsEvent(AnalyticsEventPayload),
}

impl JobPayload {
    /// The class of this payload.
    pub fn class(&self) -> JobClass {
        match self {
            Self::IdentityVerification(_) => JobClass::IdentityVerification,
            Self::ImageTransform(_) => JobClass::ImageTransform,
            Self::EmailSend(_) => JobClass::EmailSend,
            Self::PushNotify(_) => JobClass::PushNotify,
            Self::AnalyticsEvent(_) => JobClass::AnalyticsEvent,
        }
    }

    /// The subject a completion should be reported against, if any.
    pub fn subject_id(&self) -> Option<SubjectId> {
        match self {
            Self::IdentityVerification(p) => Some(p.user_id),
            Self::ImageTransform(p) => Some(p.owner_id),
            Self::EmailSend(p) => p.user_id,
            Self::PushNotify(p) => Some(p.user_id),
            Self::AnalyticsEvent(p) => p.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_tagged_with_job_class() {
        let user_id = SubjectId::new();
        let payload = JobPayload::PushNotify(PushNotifyPayload {
            user_id,
            title: "Hi".to_string(),
            body: "There".to_string(),
            data: None,
        });

        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["jobClass"], "PushNotify");
        assert_eq!(value["userId"], user_id.to_string());
        assert!(value.get("data").is_none());

        let back: JobPayload = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back.class(), JobClass::PushNotify);
        assert_eq!(back.subject_id(), Some(user_id));
    }

    #[test]
    fn test_document_type_names_match_serde() {
        for name in DocumentType::NAMES {
            let parsed: DocumentType =
                serde_json::from_value(Value::String((*name).to_string())).expect("known name");
            assert_eq!(serde_json::to_value(parsed).expect("serialize"), *name);
        }
    }

    #[test]
    fn test_image_format_names_match_serde() {
        for name in ImageFormat::NAMES {
            let parsed: ImageFormat =
                serde_json::from_value(Value::String((*name).to_string())).expect("known name");
            assert_eq!(serde_json::to_value(parsed).expect("serialize"), *name);
        }
    }
}
