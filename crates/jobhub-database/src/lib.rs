//! # jobhub-database
//!
//! Durable state written by the completion dispatcher: per-subject records
//! and the append-only notification log, plus the completion store that
//! writes both for one job as a unit. Every store has an in-memory backend
//! (single node, tests) and a PostgreSQL backend.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod provider;
pub mod store;

pub use connection::DatabasePool;
pub use provider::Stores;
pub use store::{CompletionRecord, CompletionStore, NotificationStore, SubjectStore};
