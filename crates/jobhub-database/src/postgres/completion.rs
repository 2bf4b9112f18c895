//! PostgreSQL completion store.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_entity::notification::NewNotification;
use jobhub_entity::subject::SubjectUpdate;

use super::db_error;
use super::notification::{from_row, insert};
use super::subject::{apply_update, ensure_subject};
use crate::store::{CompletionRecord, CompletionStore};

/// Writes the subject update and the notification of a job in one
/// transaction. The subject row is locked for the duration, so concurrent
/// deliveries of the same job see each other's result.
#[derive(Debug, Clone)]
pub struct PgCompletionStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgCompletionStore {
    /// Create a new completion store.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl CompletionStore for PgCompletionStore {
    async fn record_completion(
        &self,
        subject_id: SubjectId,
        job_handle: JobHandle,
        update: SubjectUpdate,
        notification: NewNotification,
    ) -> AppResult<CompletionRecord> {
        let now = self.clock.now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        ensure_subject(&mut tx, subject_id).await?;
        sqlx::query("SELECT subject_id FROM subjects WHERE subject_id = $1 FOR UPDATE")
            .bind(subject_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to lock subject"))?;

        let existing = sqlx::query(
            "SELECT id, subject_id, category, title, message, job_handle, created_at \
             FROM notifications WHERE subject_id = $1 AND job_handle = $2",
        )
        .bind(subject_id)
        .bind(job_handle)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to look up completion"))?;

        if let Some(row) = existing {
            let notification = from_row(&row)?;
            tx.rollback()
                .await
                .map_err(db_error("Failed to end transaction"))?;
            return Ok(CompletionRecord {
                notification,
                newly_recorded: false,
            });
        }

        apply_update(&mut tx, subject_id, update, now).await?;
        let notification = notification.into_notification(now);
        insert(&mut *tx, &notification).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit completion"))?;

        Ok(CompletionRecord {
            notification,
            newly_recorded: true,
        })
    }
}
