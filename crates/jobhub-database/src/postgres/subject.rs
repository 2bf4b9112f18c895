//! PostgreSQL subject store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};

use jobhub_core::result::AppResult;
use jobhub_core::traits::Clock;
use jobhub_core::types::{JobHandle, SubjectId};
use jobhub_entity::subject::{
    AssetStatus, DeliveryStatus, EmailDelivery, MediaAsset, SubjectRecord, SubjectUpdate,
    VerificationStatus,
};

use super::{db_error, decode_error};
use crate::store::SubjectStore;

/// Subject records in the `subjects`, `media_assets` and `email_deliveries` tables.
#[derive(Debug, Clone)]
pub struct PgSubjectStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgSubjectStore {
    /// Create a new subject store.
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl SubjectStore for PgSubjectStore {
    async fn apply(&self, subject_id: SubjectId, update: SubjectUpdate) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;
        apply_update(&mut tx, subject_id, update, self.clock.now()).await?;
        tx.commit()
            .await
            .map_err(db_error("Failed to commit subject update"))
    }

    async fn get(&self, subject_id: SubjectId) -> AppResult<Option<SubjectRecord>> {
        let Some(row) = sqlx::query(
            "SELECT verification_status, verification_job, verification_updated_at \
             FROM subjects WHERE subject_id = $1",
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to load subject"))?
        else {
            return Ok(None);
        };

        let status: String = row
            .try_get("verification_status")
            .map_err(db_error("Failed to read verification_status"))?;
        let mut record = SubjectRecord::new(subject_id);
        record.verification_status = status
            .parse::<VerificationStatus>()
            .map_err(|e| decode_error("verification_status", e))?;
        record.verification_job = row
            .try_get::<Option<JobHandle>, _>("verification_job")
            .map_err(db_error("Failed to read verification_job"))?;
        record.verification_updated_at = row
            .try_get::<Option<DateTime<Utc>>, _>("verification_updated_at")
            .map_err(db_error("Failed to read verification_updated_at"))?;

        let assets = sqlx::query(
            "SELECT job_handle, status, url, recorded_at FROM media_assets \
             WHERE subject_id = $1 ORDER BY id",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load media assets"))?;
        for row in assets {
            let status: String = row
                .try_get("status")
                .map_err(db_error("Failed to read media asset status"))?;
            record.media_assets.push(MediaAsset {
                job_handle: row
                    .try_get("job_handle")
                    .map_err(db_error("Failed to read media asset job"))?,
                status: status
                    .parse::<AssetStatus>()
                    .map_err(|e| decode_error("status", e))?,
                url: row
                    .try_get("url")
                    .map_err(db_error("Failed to read media asset url"))?,
                recorded_at: row
                    .try_get("recorded_at")
                    .map_err(db_error("Failed to read media asset time"))?,
            });
        }

        let deliveries = sqlx::query(
            "SELECT job_handle, status, recorded_at FROM email_deliveries \
             WHERE subject_id = $1 ORDER BY id",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load email deliveries"))?;
        for row in deliveries {
            let status: String = row
                .try_get("status")
                .map_err(db_error("Failed to read delivery status"))?;
            record.email_deliveries.push(EmailDelivery {
                job_handle: row
                    .try_get("job_handle")
                    .map_err(db_error("Failed to read delivery job"))?,
                status: status
                    .parse::<DeliveryStatus>()
                    .map_err(|e| decode_error("status", e))?,
                recorded_at: row
                    .try_get("recorded_at")
                    .map_err(db_error("Failed to read delivery time"))?,
            });
        }

        Ok(Some(record))
    }

    async fn verification_status(&self, subject_id: SubjectId) -> AppResult<VerificationStatus> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT verification_status FROM subjects WHERE subject_id = $1")
                .bind(subject_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to load verification status"))?;

        match status {
            Some(s) => s
                .parse::<VerificationStatus>()
                .map_err(|e| decode_error("verification_status", e)),
            None => Ok(VerificationStatus::Unverified),
        }
    }
}

pub(super) async fn ensure_subject(
    tx: &mut Transaction<'_, Postgres>,
    subject_id: SubjectId,
) -> AppResult<()> {
    sqlx::query("INSERT INTO subjects (subject_id) VALUES ($1) ON CONFLICT (subject_id) DO NOTHING")
        .bind(subject_id)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to create subject"))?;
    Ok(())
}

/// Write one subject update inside `tx`. Media and email outcomes are
/// upserted on `(subject_id, job_handle)`.
pub(super) async fn apply_update(
    tx: &mut Transaction<'_, Postgres>,
    subject_id: SubjectId,
    update: SubjectUpdate,
    now: DateTime<Utc>,
) -> AppResult<()> {
    match update {
        SubjectUpdate::Verification { status, job_handle } => {
            sqlx::query(
                "INSERT INTO subjects (subject_id, verification_status, verification_job, verification_updated_at) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (subject_id) DO UPDATE SET \
                 verification_status = EXCLUDED.verification_status, \
                 verification_job = EXCLUDED.verification_job, \
                 verification_updated_at = EXCLUDED.verification_updated_at",
            )
            .bind(subject_id)
            .bind(status.as_str())
            .bind(job_handle)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to update verification status"))?;
        }
        SubjectUpdate::MediaAsset {
            job_handle,
            status,
            url,
        } => {
            ensure_subject(tx, subject_id).await?;
            sqlx::query(
                "INSERT INTO media_assets (subject_id, job_handle, status, url, recorded_at) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (subject_id, job_handle) DO UPDATE SET \
                 status = EXCLUDED.status, url = EXCLUDED.url, recorded_at = EXCLUDED.recorded_at",
            )
            .bind(subject_id)
            .bind(job_handle)
            .bind(status.as_str())
            .bind(url)
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to record media asset"))?;
        }
        SubjectUpdate::EmailDelivery { job_handle, status } => {
            ensure_subject(tx, subject_id).await?;
            sqlx::query(
                "INSERT INTO email_deliveries (subject_id, job_handle, status, recorded_at) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (subject_id, job_handle) DO UPDATE SET \
                 status = EXCLUDED.status, recorded_at = EXCLUDED.recorded_at",
            )
            .bind(subject_id)
            .bind(job_handle)
            .bind(status.as_str())
            .bind(now)
            .execute(&mut **tx)
            .await
            .map_err(db_error("Failed to record email delivery"))?;
        }
    }
    Ok(())
}
