//! # jobhub-api
//!
//! HTTP API layer for JobHub built on Axum.
//!
//! Provides the submission, status, statistics, health and completion
//! webhook endpoints, request middleware, DTOs and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
