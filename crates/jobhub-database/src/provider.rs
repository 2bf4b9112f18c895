//! Store selection from configuration.

use std::sync::Arc;

use tracing::info;

use jobhub_core::config::DatabaseConfig;
use jobhub_core::error::AppError;
use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;

use crate::connection::DatabasePool;
use crate::memory::{MemoryCompletionStore, MemoryNotificationStore, MemorySubjectStore};
use crate::migration::run_migrations;
use crate::postgres::{PgCompletionStore, PgNotificationStore, PgSubjectStore};
use crate::store::{CompletionStore, NotificationStore, SubjectStore};

/// Subject and notification stores, the completion store that writes both,
/// and the pool when backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Subject records.
    pub subjects: Arc<dyn SubjectStore>,
    /// Notification log.
    pub notifications: Arc<dyn NotificationStore>,
    /// Per-job writes of a subject update plus its notification.
    pub completions: Arc<dyn CompletionStore>,
    /// PostgreSQL pool, if any.
    pub pool: Option<DatabasePool>,
}

impl Stores {
    /// In-memory stores.
    pub fn memory(clock: Arc<dyn Clock>) -> Self {
        let subjects = Arc::new(MemorySubjectStore::new(Arc::clone(&clock)));
        let notifications: Arc<dyn NotificationStore> =
            Arc::new(MemoryNotificationStore::new(clock));
        let completions =
            MemoryCompletionStore::new(Arc::clone(&subjects), Arc::clone(&notifications));
        Self {
            subjects,
            notifications,
            completions: Arc::new(completions),
            pool: None,
        }
    }

    /// Build the stores named by `config.provider`.
    pub async fn connect(config: &DatabaseConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        match config.provider.as_str() {
            "memory" => {
                info!("Using in-memory subject and notification stores");
                Ok(Self::memory(clock))
            }
            "postgres" => {
                let pool = DatabasePool::connect(config).await?;
                if config.run_migrations {
                    run_migrations(pool.pool()).await?;
                }
                Ok(Self {
                    subjects: Arc::new(PgSubjectStore::new(
                        pool.pool().clone(),
                        Arc::clone(&clock),
                    )),
                    notifications: Arc::new(PgNotificationStore::new(
                        pool.pool().clone(),
                        Arc::clone(&clock),
                    )),
                    completions: Arc::new(PgCompletionStore::new(pool.pool().clone(), clock)),
                    pool: Some(pool),
                })
            }
            other => Err(AppError::configuration(format!(
                "Unknown database provider: '{other}'. Supported: memory, postgres"
            ))),
        }
    }

    /// Check backend connectivity.
    pub async fn health_check(&self) -> AppResult<bool> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhub_core::error::ErrorKind;
    use jobhub_core::traits::SystemClock;

    #[tokio::test]
    async fn test_memory_provider() {
        let stores = Stores::connect(&DatabaseConfig::default(), Arc::new(SystemClock))
            .await
            .unwrap();
        assert!(stores.pool.is_none());
        assert!(stores.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let config = DatabaseConfig {
            provider: "mongo".to_string(),
            ..DatabaseConfig::default()
        };
        let err = Stores::connect(&config, Arc::new(SystemClock))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}
