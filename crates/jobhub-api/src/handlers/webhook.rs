//! Completion webhook receiver.
//!
//! The raw body is authenticated before it is parsed; nothing is dispatched
//! unless the signature and timestamp check out.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

use jobhub_auth::{SIGNATURE_HEADER, TIMESTAMP_HEADER};
use jobhub_core::error::AppError;
use jobhub_core::sanitize::truncate_identifier;
use jobhub_entity::webhook::WebhookEvent;

use crate::dto::response::WebhookAck;
use crate::error::ApiResult;
use crate::state::AppState;

/// Characters of a job handle kept in rejection logs.
const LOGGED_HANDLE_CHARS: usize = 8;

/// POST /webhooks/job-complete
pub async fn job_complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookAck>> {
    let signature = header_str(&headers, SIGNATURE_HEADER);
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);

    if let Err(err) = state.authenticator.verify(signature, timestamp, &body) {
        warn!(
            reason = err.reason(),
            handle = %logged_handle(&body),
            "Rejected completion webhook"
        );
        return Err(err.into());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid completion event: {e}")))?;

    state.dispatcher.dispatch(&event).await?;
    Ok(Json(WebhookAck {}))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Best-effort job handle of an unauthenticated body, for logging only.
fn logged_handle(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("jobHandle").and_then(Value::as_str).map(str::to_string))
        .map(|h| truncate_identifier(&h, LOGGED_HANDLE_CHARS))
        .unwrap_or_else(|| "<unknown>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_handle_is_truncated_and_clean() {
        let body = br#"{"jobHandle":"0190f5c2-\n[ERROR] forged-aaaa"}"#;
        let logged = logged_handle(body);
        assert!(!logged.contains('\n'));
        assert!(logged.starts_with("0190f5c2"));
        assert_eq!(logged_handle(b"not json"), "<unknown>");
    }
}
