//! Dispatch job repository
//!
//! Claiming uses `FOR UPDATE SKIP LOCKED` so a crashed-and-restarted
//! process cannot race its own replacement over the same job row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wavesend_common::types::MessageId;

use crate::models::DispatchJob;
use crate::store::{JobStore, StoreError};

/// Dispatch job repository
#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn enqueue(
        &self,
        message_id: MessageId,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // Unique message_id makes the enqueue idempotent
        let result = sqlx::query(
            r#"
            INSERT INTO dispatch_jobs (id, message_id, status, attempts, max_attempts, next_attempt_at)
            VALUES ($1, $2, 'pending', 0, $3, $4)
            ON CONFLICT (message_id) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(message_id)
        .bind(max_attempts)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_next_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DispatchJob>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, DispatchJob>(
            r#"
            SELECT * FROM dispatch_jobs
            WHERE status = 'pending' AND next_attempt_at <= $1
            ORDER BY next_attempt_at ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let job = match job {
            Some(job) => job,
            None => {
                tx.commit().await?;
                return Ok(None);
            }
        };

        sqlx::query("UPDATE dispatch_jobs SET status = 'processing' WHERE id = $1")
            .bind(job.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(job))
    }

    async fn complete(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE dispatch_jobs SET status = 'completed', completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE dispatch_jobs SET
                status = 'pending',
                attempts = $2,
                last_error = $3,
                next_attempt_at = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(attempts)
        .bind(error)
        .bind(next_attempt_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE dispatch_jobs SET status = 'failed', last_error = $2, completed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
