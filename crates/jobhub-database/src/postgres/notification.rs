//! PostgreSQL notification log.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, PgPool, Row};

use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_core::types::SubjectId;
use jobhub_entity::notification::{NewNotification, Notification, NotificationCategory};

use super::{db_error, decode_error};
use crate::store::NotificationStore;

/// Notifications in the `notifications` table. Rows are never updated.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgNotificationStore {
    /// Create a new notification store.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

pub(super) fn from_row(row: &PgRow) -> AppResult<Notification> {
    let category: String = row
        .try_get("category")
        .map_err(db_error("Failed to read notification category"))?;
    Ok(Notification {
        id: row
            .try_get("id")
            .map_err(db_error("Failed to read notification id"))?,
        subject_id: row
            .try_get("subject_id")
            .map_err(db_error("Failed to read notification subject"))?,
        category: category
            .parse::<NotificationCategory>()
            .map_err(|e| decode_error("category", e))?,
        title: row
            .try_get("title")
            .map_err(db_error("Failed to read notification title"))?,
        message: row
            .try_get("message")
            .map_err(db_error("Failed to read notification message"))?,
        job_handle: row
            .try_get("job_handle")
            .map_err(db_error("Failed to read notification job"))?,
        created_at: row
            .try_get("created_at")
            .map_err(db_error("Failed to read notification time"))?,
    })
}

/// Insert one notification row.
pub(super) async fn insert<'e>(
    executor: impl PgExecutor<'e>,
    record: &Notification,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO notifications (id, subject_id, category, title, message, job_handle, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(record.id)
    .bind(record.subject_id)
    .bind(record.category.as_str())
    .bind(&record.title)
    .bind(&record.message)
    .bind(record.job_handle)
    .bind(record.created_at)
    .execute(executor)
    .await
    .map_err(db_error("Failed to create notification"))?;
    Ok(())
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn append(&self, notification: NewNotification) -> AppResult<Notification> {
        let record = notification.into_notification(self.clock.now());
        insert(&self.pool, &record).await?;
        Ok(record)
    }

    async fn list_for_subject(&self, subject_id: SubjectId) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, subject_id, category, title, message, job_handle, created_at \
             FROM notifications WHERE subject_id = $1 ORDER BY created_at, id",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list notifications"))?;

        rows.iter().map(from_row).collect()
    }

    async fn count_for_subject(&self, subject_id: SubjectId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE subject_id = $1")
                .bind(subject_id)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to count notifications"))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
