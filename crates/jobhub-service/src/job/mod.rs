//! Job submission and status read paths.

pub mod status;
pub mod submission;

pub use status::{ClassStats, QueueStats, StatusService};
pub use submission::{Submission, SubmissionService};
