//! Completion dispatcher.
//!
//! Routes an authenticated [`WebhookEvent`] to the handler of its job class.
//! A handled event produces exactly one subject state update and exactly one
//! notification, written together per job handle; redelivering the event
//! changes nothing. Events for unknown classes, or classes without a
//! completion handler, are logged and dropped.

use serde_json::Value;
use tracing::{info, warn};

use jobhub_core::result::AppResult;
use jobhub_core::sanitize::{for_log, truncate_identifier};
use jobhub_core::types::NotificationId;
use jobhub_entity::job::JobClass;
use jobhub_entity::notification::NewNotification;
use jobhub_entity::subject::{AssetStatus, DeliveryStatus, SubjectUpdate, VerificationStatus};
use jobhub_entity::webhook::{CompletionStatus, WebhookEvent};

use super::messages::{self, NotificationCopy};
use crate::notification::NotificationService;

/// Characters of an identifier kept in logs.
const LOGGED_ID_CHARS: usize = 8;

/// Longest worker error message written to the log.
const LOGGED_ERROR_CHARS: usize = 512;

/// What the dispatcher did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// State was updated and a notification created.
    Applied {
        /// Class of the completed job.
        class: JobClass,
        /// The notification that was created.
        notification_id: NotificationId,
    },
    /// The job was recorded by an earlier delivery; nothing changed.
    AlreadyRecorded {
        /// Class of the completed job.
        class: JobClass,
        /// The notification created by the earlier delivery.
        notification_id: NotificationId,
    },
    /// The event was logged and ignored.
    Dropped {
        /// Why the event was ignored.
        reason: &'static str,
    },
}

/// Applies completion events to subject state and notifications.
#[derive(Debug, Clone)]
pub struct CompletionDispatcher {
    notifications: NotificationService,
}

impl CompletionDispatcher {
    /// Create a new dispatcher.
    pub fn new(notifications: NotificationService) -> Self {
        Self { notifications }
    }

    /// Dispatch one authenticated event.
    ///
    /// Store failures are returned to the caller; nothing in here panics.
    pub async fn dispatch(&self, event: &WebhookEvent) -> AppResult<DispatchOutcome> {
        let handle = truncate_identifier(&event.job_handle.to_string(), LOGGED_ID_CHARS);
        let subject = truncate_identifier(&event.subject_id.to_string(), LOGGED_ID_CHARS);

        if event.status == CompletionStatus::Failed {
            let detail = event
                .error_message()
                .map(|m| for_log(&m, LOGGED_ERROR_CHARS))
                .unwrap_or_else(|| "<none>".to_string());
            warn!(
                handle = %handle,
                subject = %subject,
                job_class = %for_log(&event.job_class, 64),
                error = %detail,
                "Job reported terminal failure"
            );
        }

        let Ok(class) = event.class() else {
            warn!(
                handle = %handle,
                job_class = %for_log(&event.job_class, 64),
                "Dropping completion event for unknown job class"
            );
            return Ok(DispatchOutcome::Dropped {
                reason: "unknown_job_class",
            });
        };

        let (update, copy) = match class {
            JobClass::IdentityVerification => (
                SubjectUpdate::Verification {
                    status: match event.status {
                        CompletionStatus::Completed => VerificationStatus::Verified,
                        CompletionStatus::Failed => VerificationStatus::Failed,
                    },
                    job_handle: event.job_handle,
                },
                messages::identity_verification(event.status),
            ),
            JobClass::ImageTransform => (
                SubjectUpdate::MediaAsset {
                    job_handle: event.job_handle,
                    status: match event.status {
                        CompletionStatus::Completed => AssetStatus::Ready,
                        CompletionStatus::Failed => AssetStatus::Failed,
                    },
                    url: result_url(event),
                },
                messages::image_processing(event.status),
            ),
            JobClass::EmailSend => (
                SubjectUpdate::EmailDelivery {
                    job_handle: event.job_handle,
                    status: match event.status {
                        CompletionStatus::Completed => DeliveryStatus::Delivered,
                        CompletionStatus::Failed => DeliveryStatus::Failed,
                    },
                },
                messages::email(event.status),
            ),
            JobClass::PushNotify | JobClass::AnalyticsEvent => {
                info!(
                    handle = %handle,
                    class = %class,
                    status = %event.status,
                    "No completion handler for job class, dropping event"
                );
                return Ok(DispatchOutcome::Dropped {
                    reason: "no_completion_handler",
                });
            }
        };

        let recorded = self
            .notifications
            .record_completion(event.job_handle, update, notification(event, copy))
            .await?;
        let notification_id = recorded.notification.id;

        if !recorded.newly_recorded {
            info!(
                handle = %handle,
                subject = %subject,
                class = %class,
                "Completion already recorded, ignoring redelivery"
            );
            return Ok(DispatchOutcome::AlreadyRecorded {
                class,
                notification_id,
            });
        }

        info!(
            handle = %handle,
            subject = %subject,
            class = %class,
            status = %event.status,
            "Completion event dispatched"
        );
        Ok(DispatchOutcome::Applied {
            class,
            notification_id,
        })
    }
}

fn notification(event: &WebhookEvent, copy: NotificationCopy) -> NewNotification {
    NewNotification {
        subject_id: event.subject_id,
        category: copy.category,
        title: copy.title.to_string(),
        message: copy.message.to_string(),
        job_handle: Some(event.job_handle),
    }
}

/// Location of a processed asset, if the worker reported an http(s) one.
fn result_url(event: &WebhookEvent) -> Option<String> {
    if event.status != CompletionStatus::Completed {
        return None;
    }
    event
        .result
        .as_ref()?
        .get("url")
        .and_then(Value::as_str)
        .filter(|u| u.starts_with("https://") || u.starts_with("http://"))
        .map(jobhub_core::sanitize::strip_control_chars)
}
