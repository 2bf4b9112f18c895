//! User-facing copy for completion notifications. Never includes worker
//! error detail.

use jobhub_entity::notification::NotificationCategory;
use jobhub_entity::webhook::CompletionStatus;

/// Title and message for one outcome.
pub(crate) struct NotificationCopy {
    pub category: NotificationCategory,
    pub title: &'static str,
    pub message: &'static str,
}

pub(crate) fn identity_verification(status: CompletionStatus) -> NotificationCopy {
    let (title, message) = match status {
        CompletionStatus::Completed => (
            "Identity verified",
            "Your identity has been verified. You now have full access to your account.",
        ),
        CompletionStatus::Failed => (
            "Identity verification unsuccessful",
            "We couldn't verify your identity. Please check that your document photos are clear and try again.",
        ),
    };
    NotificationCopy {
        category: NotificationCategory::IdentityVerification,
        title,
        message,
    }
}

pub(crate) fn image_processing(status: CompletionStatus) -> NotificationCopy {
    let (title, message) = match status {
        CompletionStatus::Completed => ("Your image is ready", "Your image has been processed."),
        CompletionStatus::Failed => (
            "Image processing failed",
            "We couldn't process your image. Please try uploading it again.",
        ),
    };
    NotificationCopy {
        category: NotificationCategory::Media,
        title,
        message,
    }
}

pub(crate) fn email(status: CompletionStatus) -> NotificationCopy {
    let (title, message) = match status {
        CompletionStatus::Completed => ("Email sent", "We've sent you an email."),
        CompletionStatus::Failed => (
            "Email not delivered",
            "We couldn't deliver an email to you. Please check your email address in your profile.",
        ),
    };
    NotificationCopy {
        category: NotificationCategory::Email,
        title,
        message,
    }
}
