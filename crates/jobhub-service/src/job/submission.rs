//! Job submission: validate, attach policy, enqueue.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::traits::JobBroker;
use jobhub_core::types::{EnqueueRequest, JobHandle, PriorityTier};
use jobhub_entity::job::JobClass;

use crate::policy::PolicyTable;
use crate::schema::{FieldError, FieldErrorCode, JOB_CLASS_FIELD, SchemaRegistry};

/// Result of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Broker-assigned handle.
    pub handle: JobHandle,
    /// Where the caller can poll for status.
    pub status_location: String,
    /// Class of the job.
    pub class: JobClass,
    /// Tier the job was scheduled under.
    pub tier: PriorityTier,
}

/// Validates submissions and places them in their class queue.
///
/// Nothing is enqueued unless the whole payload validates. Identical
/// submissions produce distinct jobs.
#[derive(Debug, Clone)]
pub struct SubmissionService {
    broker: Arc<dyn JobBroker>,
    registry: SchemaRegistry,
}

impl SubmissionService {
    /// Create a new submission service.
    pub fn new(broker: Arc<dyn JobBroker>) -> Self {
        Self {
            broker,
            registry: SchemaRegistry::new(),
        }
    }

    /// Submit a payload whose class is carried in its `jobClass` field.
    pub async fn submit_tagged(&self, raw: &Value) -> AppResult<Submission> {
        let class = match raw.get(JOB_CLASS_FIELD) {
            Some(Value::String(name)) => self
                .registry
                .resolve_class(name)
                .map_err(|e| rejected(vec![e]))?,
            Some(_) => {
                return Err(rejected(vec![FieldError::new(
                    JOB_CLASS_FIELD,
                    FieldErrorCode::WrongType,
                    "Expected a string",
                )]));
            }
            None => {
                return Err(rejected(vec![FieldError::new(
                    JOB_CLASS_FIELD,
                    FieldErrorCode::Missing,
                    "Field is required",
                )]));
            }
        };
        self.submit(class, raw).await
    }

    /// Submit a payload for a class named in the request path.
    ///
    /// A `jobClass` in the body, if present, must name the same class.
    pub async fn submit_named(&self, class_name: &str, raw: &Value) -> AppResult<Submission> {
        let class = self
            .registry
            .resolve_class(class_name)
            .map_err(|e| rejected(vec![e]))?;

        if let Some(tag) = raw.get(JOB_CLASS_FIELD).filter(|v| !v.is_null()) {
            let matches = tag
                .as_str()
                .and_then(|name| name.parse::<JobClass>().ok())
                .is_some_and(|c| c == class);
            if !matches {
                return Err(rejected(vec![FieldError::new(
                    JOB_CLASS_FIELD,
                    FieldErrorCode::UnknownValue,
                    format!("Body jobClass does not match '{class}'"),
                )]));
            }
        }
        self.submit(class, raw).await
    }

    /// Validate `raw` as `class` and enqueue it with the class policy.
    pub async fn submit(&self, class: JobClass, raw: &Value) -> AppResult<Submission> {
        let request = self.registry.validate(class, raw).map_err(|errors| {
            debug!(class = %class, failures = errors.len(), "Submission rejected");
            rejected(errors)
        })?;

        let policy = PolicyTable::policy_for(class);
        let (payload, correlation_id) = request.into_parts();
        let handle = self
            .broker
            .enqueue(EnqueueRequest {
                queue: class.queue_name().to_string(),
                payload: serde_json::to_value(&payload)?,
                policy,
                correlation_id,
            })
            .await?;

        info!(
            handle = %handle,
            class = %class,
            tier = %policy.tier,
            "Job submitted"
        );

        Ok(Submission {
            handle,
            status_location: status_location(&handle),
            class,
            tier: policy.tier,
        })
    }
}

/// Path at which a job's status is served.
pub fn status_location(handle: &JobHandle) -> String {
    format!("/jobs/{handle}")
}

fn rejected(errors: Vec<FieldError>) -> AppError {
    let count = errors.len();
    let details = serde_json::to_value(&errors).unwrap_or(Value::Array(Vec::new()));
    AppError::validation(format!("Job request failed validation ({count} field errors)"))
        .with_details(details)
}
