//! Completion webhook entities.

pub mod event;

pub use event::{CompletionStatus, WebhookEvent};
