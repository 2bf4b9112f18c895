//! Queue statistics handler.

use axum::Json;
use axum::extract::State;

use jobhub_service::QueueStats;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<QueueStats>> {
    Ok(Json(state.status.stats().await?))
}
