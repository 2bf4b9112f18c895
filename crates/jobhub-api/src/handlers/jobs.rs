//! Job submission and status handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use bytes::Bytes;
use serde_json::Value;

use jobhub_core::error::AppError;
use jobhub_service::Submission;

use crate::dto::response::{JobStatusResponse, SubmitJobResponse};
use crate::error::ApiResult;
use crate::state::AppState;

type Accepted = (StatusCode, [(axum::http::HeaderName, String); 1], Json<SubmitJobResponse>);

/// POST /jobs
///
/// The job class is read from the body's `jobClass` field.
pub async fn submit_job(State(state): State<AppState>, body: Bytes) -> ApiResult<Accepted> {
    let raw = parse_body(&body)?;
    let submission = state.submissions.submit_tagged(&raw).await?;
    Ok(accepted(&state, submission))
}

/// POST /jobs/{class}
pub async fn submit_job_for_class(
    State(state): State<AppState>,
    Path(class): Path<String>,
    body: Bytes,
) -> ApiResult<Accepted> {
    let raw = parse_body(&body)?;
    let submission = state.submissions.submit_named(&class, &raw).await?;
    Ok(accepted(&state, submission))
}

/// GET /jobs/{handle}
pub async fn get_job(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let snapshot = state.status.get_status(&handle).await?;
    Ok(Json(snapshot.into()))
}

fn parse_body(body: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Request body is not valid JSON: {e}")))
}

fn accepted(state: &AppState, submission: Submission) -> Accepted {
    let base = state.config.server.public_base_url.trim_end_matches('/');
    let location = format!("{base}{}", submission.status_location);
    (
        StatusCode::ACCEPTED,
        [(LOCATION, location.clone())],
        Json(SubmitJobResponse {
            handle: submission.handle,
            status_location: location,
        }),
    )
}
