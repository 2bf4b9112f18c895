//! Ports defined in `jobhub-core` and implemented by other crates.

pub mod broker;
pub mod clock;

pub use broker::JobBroker;
pub use clock::{Clock, ManualClock, SystemClock};
