//! Broker selection from configuration.

use std::sync::Arc;

use tracing::info;

use jobhub_core::config::BrokerConfig;
use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::traits::{Clock, JobBroker};

use crate::memory::MemoryBroker;

/// Build the broker named by `config.provider`.
pub fn connect(config: &BrokerConfig, clock: Arc<dyn Clock>) -> AppResult<Arc<dyn JobBroker>> {
    match config.provider.as_str() {
        "memory" => {
            info!("Initializing in-memory job broker");
            Ok(Arc::new(MemoryBroker::new(clock)))
        }
        other => Err(AppError::configuration(format!(
            "Unknown broker provider: '{other}'. Supported: memory"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhub_core::traits::SystemClock;

    #[test]
    fn test_unknown_provider_is_configuration_error() {
        let config = BrokerConfig {
            provider: "kafka".to_string(),
        };
        let err = connect(&config, Arc::new(SystemClock)).unwrap_err();
        assert_eq!(err.kind, jobhub_core::error::ErrorKind::Configuration);
    }

    #[test]
    fn test_memory_provider() {
        assert!(connect(&BrokerConfig::default(), Arc::new(SystemClock)).is_ok());
    }
}
