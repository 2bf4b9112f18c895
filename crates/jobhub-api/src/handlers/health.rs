//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let broker_ok = state.broker.health_check().await.unwrap_or(false);
    let database_ok = state.stores.health_check().await.unwrap_or(false);
    let healthy = broker_ok && database_ok;

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            broker: reachability(broker_ok),
            database: reachability(database_ok),
        }),
    )
}

fn reachability(ok: bool) -> String {
    if ok { "connected" } else { "unavailable" }.to_string()
}
