//! Background job execution for JobHub.
//!
//! This crate provides:
//! - A worker runner that claims jobs from the broker in priority-tier order
//! - A job executor that dispatches jobs to the handler of their class
//! - An HTTP delegate handler that forwards payloads to external executors
//! - A completion reporter that posts signed webhook events

pub mod executor;
pub mod handlers;
pub mod reporter;
pub mod runner;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use reporter::{CompletionReporter, WebhookReporter};
pub use runner::WorkerRunner;
