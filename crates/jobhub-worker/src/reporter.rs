//! Signed completion reports sent back to the API's webhook receiver.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing;

use jobhub_auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookSigner};
use jobhub_core::error::{AppError, ErrorKind};
use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_entity::webhook::WebhookEvent;

/// Delivers terminal job outcomes to the completion webhook.
#[async_trait]
pub trait CompletionReporter: Send + Sync + std::fmt::Debug {
    /// Report one terminal outcome.
    async fn report(&self, event: &WebhookEvent) -> AppResult<()>;
}

/// A request body with the headers that authenticate it.
#[derive(Debug, Clone)]
pub struct SignedEvent {
    /// Serialized event.
    pub body: Vec<u8>,
    /// Hex HMAC over the canonical body and timestamp.
    pub signature: String,
    /// Epoch seconds included in the signature.
    pub timestamp: String,
}

/// Posts events signed with the shared webhook secret.
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    client: Client,
    url: String,
    signer: WebhookSigner,
    clock: Arc<dyn Clock>,
}

impl WebhookReporter {
    /// Create a reporter posting to `url`.
    pub fn new(
        url: String,
        secret: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        if secret.is_empty() {
            return Err(AppError::configuration(
                "A webhook secret is required to report completions",
            ));
        }
        let signer = WebhookSigner::new(secret.as_bytes())?;
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                "Failed to build HTTP client for completion reporter",
                e,
            )
        })?;
        Ok(Self {
            client,
            url,
            signer,
            clock,
        })
    }

    /// Serialize and sign `event` with the current timestamp.
    pub fn sign(&self, event: &WebhookEvent) -> AppResult<SignedEvent> {
        let body = serde_json::to_vec(event)?;
        let timestamp = self.clock.now().timestamp().to_string();
        let signature = self.signer.sign(&body, Some(&timestamp));
        Ok(SignedEvent {
            body,
            signature,
            timestamp,
        })
    }
}

#[async_trait]
impl CompletionReporter for WebhookReporter {
    async fn report(&self, event: &WebhookEvent) -> AppResult<()> {
        let signed = self.sign(event)?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signed.signature)
            .header(TIMESTAMP_HEADER, signed.timestamp)
            .body(signed.body)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    "Failed to deliver completion webhook",
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(format!(
                "Completion webhook rejected with status {status}"
            )));
        }

        tracing::debug!(
            handle = %event.job_handle,
            status = %event.status,
            "Completion reported"
        );
        Ok(())
    }
}
