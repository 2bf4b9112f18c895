//! HTTP integration tests driven through the Axum router.

mod helpers;
mod jobs_test;
mod webhook_test;
