//! `validator` forms, one per job class.
//!
//! Every field is optional so that absence is reported by the `required`
//! rule instead of failing deserialization. A form that validates converts
//! into its typed payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::Validate;

use jobhub_core::types::SubjectId;
use jobhub_entity::job::{
    AnalyticsEventPayload, DocumentType, EmailSendPayload, IdentityVerificationPayload,
    ImageFormat, ImageTransformPayload, JobPayload, PushNotifyPayload,
};

/// A form that becomes a [`JobPayload`] once it validates.
pub(crate) trait PayloadForm: DeserializeOwned + Validate {
    /// Build the payload. `None` only if a required field is absent, which
    /// validation has already reported.
    fn into_payload(self) -> Option<JobPayload>;
}

/// Fields shared by every submission.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvelopeForm {
    #[validate(length(min = 1, max = 128))]
    pub correlation_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdentityVerificationForm {
    #[validate(required)]
    user_id: Option<SubjectId>,
    #[validate(required)]
    document_type: Option<DocumentType>,
    #[validate(required, length(min = 5, max = 64))]
    document_number: Option<String>,
    #[validate(required, length(min = 1, message = "At least one image URL is required"))]
    image_urls: Option<Vec<String>>,
    selfie_url: Option<String>,
}

impl PayloadForm for IdentityVerificationForm {
    fn into_payload(self) -> Option<JobPayload> {
        Some(JobPayload::IdentityVerification(
            IdentityVerificationPayload {
                user_id: self.user_id?,
                document_type: self.document_type?,
                document_number: self.document_number?,
                image_urls: self.image_urls?,
                selfie_url: self.selfie_url,
            },
        ))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageTransformForm {
    #[validate(required)]
    owner_id: Option<SubjectId>,
    #[validate(required)]
    image_url: Option<String>,
    #[validate(required)]
    format: Option<ImageFormat>,
    #[validate(range(min = 1, max = 8192))]
    width: Option<u32>,
    #[validate(range(min = 1, max = 8192))]
    height: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    quality: Option<u32>,
}

impl PayloadForm for ImageTransformForm {
    fn into_payload(self) -> Option<JobPayload> {
        Some(JobPayload::ImageTransform(ImageTransformPayload {
            owner_id: self.owner_id?,
            image_url: self.image_url?,
            format: self.format?,
            width: self.width,
            height: self.height,
            quality: self.quality.and_then(|q| u8::try_from(q).ok()),
        }))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmailSendForm {
    #[validate(required, email)]
    to: Option<String>,
    #[validate(required, length(min = 1, max = 100))]
    template: Option<String>,
    #[validate(required)]
    data: Option<Map<String, Value>>,
    user_id: Option<SubjectId>,
}

impl PayloadForm for EmailSendForm {
    fn into_payload(self) -> Option<JobPayload> {
        Some(JobPayload::EmailSend(EmailSendPayload {
            to: self.to?,
            template: self.template?,
            data: self.data?,
            user_id: self.user_id,
        }))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PushNotifyForm {
    #[validate(required)]
    user_id: Option<SubjectId>,
    #[validate(required, length(min = 1, max = 120))]
    title: Option<String>,
    #[validate(required, length(min = 1, max = 1000))]
    body: Option<String>,
    data: Option<Map<String, Value>>,
}

impl PayloadForm for PushNotifyForm {
    fn into_payload(self) -> Option<JobPayload> {
        Some(JobPayload::PushNotify(PushNotifyPayload {
            user_id: self.user_id?,
            title: self.title?,
            body: self.body?,
            data: self.data,
        }))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnalyticsEventForm {
    #[validate(required, length(min = 1, max = 100))]
    event: Option<String>,
    user_id: Option<SubjectId>,
    properties: Option<Map<String, Value>>,
    occurred_at: Option<DateTime<Utc>>,
}

impl PayloadForm for AnalyticsEventForm {
    fn into_payload(self) -> Option<JobPayload> {
        Some(JobPayload::AnalyticsEvent(AnalyticsEventPayload {
            event: self.event?,
            user_id: self.user_id,
            properties: self.properties,
            occurred_at: self.occurred_at,
        }))
    }
}
