//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;

use jobhub_api::{AppState, build_app};
use jobhub_auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER, WebhookAuthenticator, WebhookSigner};
use jobhub_broker::MemoryBroker;
use jobhub_core::config::AppConfig;
use jobhub_core::traits::{Clock, JobBroker, ManualClock};
use jobhub_database::Stores;

/// Secret shared by the test app and the signing helpers.
pub const SECRET: &str = "integration-test-webhook-secret-0123456789";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Broker behind the router, for driving workers by hand
    pub broker: Arc<MemoryBroker>,
    /// Subject and notification stores
    pub stores: Stores,
    /// Clock shared by broker, stores and authenticator
    pub clock: ManualClock,
    signer: WebhookSigner,
}

/// Decoded response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// Create a test application with the webhook secret configured
    pub fn new() -> Self {
        Self::with_secret(Some(SECRET))
    }

    /// Create a test application with an explicit (or no) webhook secret
    pub fn with_secret(secret: Option<&str>) -> Self {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());

        let mut config = AppConfig::default();
        config.webhook.secret = secret.map(str::to_string);

        let broker = Arc::new(MemoryBroker::new(Arc::clone(&shared)));
        let stores = Stores::memory(Arc::clone(&shared));
        let authenticator =
            WebhookAuthenticator::from_config(&config.webhook, Arc::clone(&shared))
                .expect("authenticator");

        let state = AppState::new(
            config,
            Arc::clone(&broker) as Arc<dyn JobBroker>,
            stores.clone(),
            authenticator,
        );

        Self {
            router: build_app(state),
            broker,
            stores,
            clock,
            signer: WebhookSigner::new(SECRET.as_bytes()).expect("signer"),
        }
    }

    /// Send a request with an optional JSON body
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(path);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    /// Post raw bytes to the completion webhook with the given headers
    pub async fn post_webhook(
        &self,
        body: &[u8],
        signature: Option<&str>,
        timestamp: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/webhooks/job-complete")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        if let Some(timestamp) = timestamp {
            builder = builder.header(TIMESTAMP_HEADER, timestamp);
        }
        let request = builder.body(Body::from(body.to_vec())).expect("request");
        self.send(request).await
    }

    /// Post `body` signed with the shared secret and a timestamp `age_seconds` old
    pub async fn post_signed_webhook(&self, body: &[u8], age_seconds: i64) -> TestResponse {
        let timestamp = self.timestamp(age_seconds);
        let signature = self.sign(body, Some(&timestamp));
        self.post_webhook(body, Some(&signature), Some(&timestamp))
            .await
    }

    /// Epoch seconds `age_seconds` before the test clock's now
    pub fn timestamp(&self, age_seconds: i64) -> String {
        (self.clock.now() - Duration::seconds(age_seconds))
            .timestamp()
            .to_string()
    }

    /// Hex signature over `body` and `timestamp`
    pub fn sign(&self, body: &[u8], timestamp: Option<&str>) -> String {
        self.signer.sign(body, timestamp)
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
