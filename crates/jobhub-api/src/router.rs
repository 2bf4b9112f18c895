//! Route definitions for the JobHub HTTP API.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and request middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes;

    Router::new()
        .merge(job_routes())
        .merge(webhook_routes())
        .merge(health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::timeout::request_timeout,
        ))
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Submission, status and statistics
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(handlers::jobs::submit_job))
        .route(
            "/jobs/{key}",
            get(handlers::jobs::get_job).post(handlers::jobs::submit_job_for_class),
        )
        .route("/stats", get(handlers::stats::get_stats))
}

/// Worker completion callbacks
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/job-complete", post(handlers::webhook::job_complete))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
