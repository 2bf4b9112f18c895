//! Webhook authentication failures.

use thiserror::Error;

use jobhub_core::error::AppError;

/// Why an inbound callback was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookAuthError {
    /// No shared secret is configured; every callback is refused.
    #[error("Webhook receiver has no shared secret configured")]
    NotConfigured,
    /// The secret could not be used as an HMAC key.
    #[error("Invalid webhook secret: {0}")]
    InvalidKey(String),
    /// The signature header is absent.
    #[error("Missing webhook signature")]
    MissingSignature,
    /// The timestamp header is present but not an integer epoch value.
    #[error("Unparseable webhook timestamp")]
    InvalidTimestamp,
    /// The timestamp is outside the accepted window.
    #[error("Webhook timestamp outside the accepted window ({skew_seconds}s skew)")]
    StaleTimestamp {
        /// Absolute difference between the timestamp and now.
        skew_seconds: i64,
    },
    /// The signature does not match the body.
    #[error("Invalid webhook signature")]
    SignatureMismatch,
}

impl WebhookAuthError {
    /// Short machine-readable reason, used in logs.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::InvalidKey(_) => "invalid_key",
            Self::MissingSignature => "missing_signature",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::StaleTimestamp { .. } => "stale_timestamp",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }
}

impl From<WebhookAuthError> for AppError {
    fn from(err: WebhookAuthError) -> Self {
        match err {
            WebhookAuthError::NotConfigured => AppError::service_unavailable(err.to_string()),
            WebhookAuthError::InvalidKey(_) => AppError::configuration(err.to_string()),
            // Callers learn only that authentication failed.
            _ => AppError::authentication("Webhook authentication failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhub_core::error::ErrorKind;

    #[test]
    fn test_maps_to_app_error_kinds() {
        assert_eq!(
            AppError::from(WebhookAuthError::NotConfigured).kind,
            ErrorKind::ServiceUnavailable
        );
        for err in [
            WebhookAuthError::MissingSignature,
            WebhookAuthError::InvalidTimestamp,
            WebhookAuthError::StaleTimestamp { skew_seconds: 360 },
            WebhookAuthError::SignatureMismatch,
        ] {
            let app: AppError = err.into();
            assert_eq!(app.kind, ErrorKind::Authentication);
            assert_eq!(app.message, "Webhook authentication failed");
        }
    }
}
