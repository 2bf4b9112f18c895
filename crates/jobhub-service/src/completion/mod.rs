//! Routing of authenticated completion events.

pub mod dispatcher;
mod messages;

pub use dispatcher::{CompletionDispatcher, DispatchOutcome};
