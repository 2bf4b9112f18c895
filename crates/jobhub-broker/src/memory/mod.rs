//! In-memory broker.

mod queue;
mod store;

pub use store::MemoryBroker;
