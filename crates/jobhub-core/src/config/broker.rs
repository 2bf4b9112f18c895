//! Job broker configuration.

use serde::{Deserialize, Serialize};

/// Selects the broker backend that owns job state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Broker provider. Currently only `"memory"`.
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}
