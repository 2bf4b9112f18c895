//! Verification of inbound completion callbacks.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use jobhub_core::config::WebhookConfig;
use jobhub_core::traits::Clock;

use super::error::WebhookAuthError;
use super::signature::WebhookSigner;

/// Secrets shorter than this are accepted but logged as weak.
const MIN_SECRET_BYTES: usize = 32;

/// Epoch values at or above this are read as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Checks signature and timestamp freshness of completion callbacks.
///
/// The secret is fixed at construction. Without one the authenticator fails
/// closed and refuses every request.
#[derive(Debug, Clone)]
pub struct WebhookAuthenticator {
    signer: Option<WebhookSigner>,
    tolerance: Duration,
    clock: Arc<dyn Clock>,
}

impl WebhookAuthenticator {
    /// Create an authenticator. An empty secret counts as unset.
    pub fn new(
        secret: Option<&str>,
        tolerance_seconds: u64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WebhookAuthError> {
        let signer = match secret.filter(|s| !s.is_empty()) {
            Some(secret) => {
                if secret.len() < MIN_SECRET_BYTES {
                    warn!(
                        length = secret.len(),
                        minimum = MIN_SECRET_BYTES,
                        "Webhook secret is shorter than recommended"
                    );
                }
                Some(WebhookSigner::new(secret.as_bytes())?)
            }
            None => {
                warn!("No webhook secret configured; completion callbacks will be refused");
                None
            }
        };

        Ok(Self {
            signer,
            tolerance: Duration::seconds(i64::try_from(tolerance_seconds).unwrap_or(i64::MAX)),
            clock,
        })
    }

    /// Create an authenticator from the `webhook` configuration section.
    pub fn from_config(
        config: &WebhookConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, WebhookAuthError> {
        Self::new(config.secret(), config.tolerance_seconds, clock)
    }

    /// Whether a secret is configured.
    pub fn is_configured(&self) -> bool {
        self.signer.is_some()
    }

    /// Authenticate one request.
    ///
    /// `signature` and `timestamp` are the raw header values; `body` is the
    /// raw request body.
    pub fn verify(
        &self,
        signature: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), WebhookAuthError> {
        let signer = self
            .signer
            .as_ref()
            .ok_or(WebhookAuthError::NotConfigured)?;

        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(WebhookAuthError::MissingSignature)?;

        let timestamp = timestamp.map(str::trim);
        if let Some(raw) = timestamp {
            let sent_at = parse_timestamp(raw).ok_or(WebhookAuthError::InvalidTimestamp)?;
            let skew = (self.clock.now() - sent_at).abs();
            if skew > self.tolerance {
                return Err(WebhookAuthError::StaleTimestamp {
                    skew_seconds: skew.num_seconds(),
                });
            }
        }

        if signer.verify(signature, body, timestamp) {
            Ok(())
        } else {
            Err(WebhookAuthError::SignatureMismatch)
        }
    }
}

/// Parse an integer epoch timestamp in seconds or milliseconds.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value: i64 = raw.parse().ok()?;
    if value.unsigned_abs() >= MILLIS_THRESHOLD.unsigned_abs() {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}
