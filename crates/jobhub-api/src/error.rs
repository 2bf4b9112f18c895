//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use jobhub_auth::WebhookAuthError;
use jobhub_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level failures of a rejected submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<serde_json::Value>,
}

/// Handler error: an [`AppError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type returned by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<WebhookAuthError> for ApiError {
    fn from(err: WebhookAuthError) -> Self {
        Self(AppError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, error_code) = match err.kind {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
            ErrorKind::ServiceUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ErrorKind::ExternalService => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ErrorKind::Internal
            | ErrorKind::Database
            | ErrorKind::Configuration
            | ErrorKind::Serialization => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            match &err.source {
                Some(source) => tracing::error!(
                    kind = %err.kind,
                    error = %err.message,
                    source = %source,
                    "Internal server error"
                ),
                None => tracing::error!(kind = %err.kind, error = %err.message, "Internal server error"),
            }
            "An internal error occurred".to_string()
        } else {
            err.message
        };

        let validation_errors = match err.kind {
            ErrorKind::Validation => err.details,
            _ => None,
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
            validation_errors,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_carries_field_errors() {
        let err = AppError::validation("Job request failed validation (1 field errors)")
            .with_details(json!([{ "field": "to", "code": "missing", "message": "Field is required" }]));
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
        assert_eq!(body["validationErrors"][0]["field"], "to");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let err = AppError::database("relation \"notifications\" does not exist");
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
        assert!(body.get("validationErrors").is_none());
    }

    #[tokio::test]
    async fn test_webhook_errors_map_to_status() {
        let (status, _) = render(WebhookAuthError::SignatureMismatch.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = render(WebhookAuthError::NotConfigured.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
