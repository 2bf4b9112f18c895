//! # jobhub-service
//!
//! Application services for JobHub. Each service receives its collaborators
//! (broker, stores) as `Arc` references at construction time.
//!
//! - `schema` — per-class payload schemas and field-level validation
//! - `policy` — the job class → priority policy table
//! - `job` — submission and status read paths
//! - `completion` — routing of authenticated completion events
//! - `notification` — user-facing notification records

pub mod completion;
pub mod job;
pub mod notification;
pub mod policy;
pub mod schema;

pub use completion::{CompletionDispatcher, DispatchOutcome};
pub use job::{ClassStats, QueueStats, StatusService, Submission, SubmissionService};
pub use notification::NotificationService;
pub use policy::PolicyTable;
pub use schema::{FieldError, FieldErrorCode, SchemaRegistry};
