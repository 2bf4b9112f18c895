//! Job payload schemas.
//!
//! Validation runs in two passes. A structural pass checks the JSON kind and
//! format of each known field (UUIDs, URLs, enums, timestamps) against the
//! class's field table and drops bad values. The remaining object is then
//! deserialized into a `validator` form that enforces presence, lengths and
//! ranges. Failures from both passes are reported together.

mod error;
mod fields;
mod forms;
mod registry;

pub use error::{FieldError, FieldErrorCode};
pub use registry::{JOB_CLASS_FIELD, SchemaRegistry};
