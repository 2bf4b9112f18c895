//! Job domain entities.

pub mod class;
pub mod payload;
pub mod request;

pub use class::{JobClass, UnknownJobClass};
pub use payload::{
    AnalyticsEventPayload, DocumentType, EmailSendPayload, IdentityVerificationPayload,
    ImageFormat, ImageTransformPayload, JobPayload, PushNotifyPayload,
};
pub use request::JobRequest;
