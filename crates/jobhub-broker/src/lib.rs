//! # jobhub-broker
//!
//! Backends for the [`JobBroker`](jobhub_core::traits::JobBroker) port. The
//! in-memory broker gives single-node deployments and tests the same
//! scheduling semantics a durable broker provides: per-queue priority with
//! FIFO ties, attempt locks with timeouts, backoff delays and retention.

pub mod memory;
pub mod provider;

pub use memory::MemoryBroker;
pub use provider::connect;
