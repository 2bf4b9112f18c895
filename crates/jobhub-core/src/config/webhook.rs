//! Completion webhook receiver configuration.

use serde::{Deserialize, Serialize};

/// Settings for the authenticated completion callback.
///
/// The secret is read once at startup and injected into the authenticator.
/// When it is absent every callback is rejected as unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret known to the server and the worker fleet.
    #[serde(default)]
    pub secret: Option<String>,
    /// Maximum allowed skew between the signed timestamp and now, in seconds.
    #[serde(default = "default_tolerance")]
    pub tolerance_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            tolerance_seconds: default_tolerance(),
        }
    }
}

impl WebhookConfig {
    /// The configured secret, treating an empty string as unset.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }
}

fn default_tolerance() -> u64 {
    300
}
