//! Embedded worker pool configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Background worker configuration.
///
/// The worker pool is normally a separate fleet; enabling it here runs one
/// in-process against the same broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the embedded worker is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in milliseconds between queue polls when idle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Worker identifier recorded on claimed jobs. Empty means generated.
    #[serde(default)]
    pub worker_id: String,
    /// URL of the completion webhook the worker reports to.
    #[serde(default = "default_callback_url")]
    pub callback_url: String,
    /// External executor endpoint per job class (keyed by queue name,
    /// e.g. `identity-verification`).
    #[serde(default)]
    pub executors: HashMap<String, String>,
    /// Timeout in seconds for outbound HTTP calls made by the worker.
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            concurrency: default_concurrency(),
            poll_interval_ms: default_poll_interval(),
            worker_id: String::new(),
            callback_url: default_callback_url(),
            executors: HashMap::new(),
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    500
}

fn default_callback_url() -> String {
    "http://127.0.0.1:8080/webhooks/job-complete".to_string()
}

fn default_http_timeout() -> u64 {
    30
}
