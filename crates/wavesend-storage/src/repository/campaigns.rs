//! Campaign repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use wavesend_common::types::CampaignId;

use crate::models::{Campaign, CampaignStatus, CreateCampaign};
use crate::store::{CampaignStore, StoreError};

/// Campaign repository
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignStore for CampaignRepository {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign, StoreError> {
        let id = Uuid::new_v4();

        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (
                id, name, message_template, contact_list_id,
                start_at, spread_days, interval_seconds, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'draft')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.message_template)
        .bind(input.contact_list_id)
        .bind(input.start_at)
        .bind(input.spread_days)
        .bind(input.interval_seconds)
        .fetch_one(&self.pool)
        .await?;

        Ok(campaign)
    }

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        let campaign = sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(campaign)
    }

    async fn list(
        &self,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = if let Some(status) = status {
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                WHERE status = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(status.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                ORDER BY created_at DESC
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(campaigns)
    }

    async fn list_by_status(
        &self,
        status: CampaignStatus,
    ) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = sqlx::query_as::<_, Campaign>(
            "SELECT * FROM campaigns WHERE status = $1 ORDER BY created_at ASC",
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(campaigns)
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, StoreError> {
        let started_at = if status == CampaignStatus::Running {
            Some(Utc::now())
        } else {
            None
        };

        let completed_at = if status.is_terminal() {
            Some(Utc::now())
        } else {
            None
        };

        let campaign = sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                status = $2,
                started_at = COALESCE(started_at, $3),
                completed_at = COALESCE(completed_at, $4),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.to_string())
        .bind(started_at)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(campaign)
    }

    async fn mark_activated(
        &self,
        id: CampaignId,
        total_messages: i32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                status = 'scheduled',
                total_messages = $2,
                sent_count = 0,
                failed_count = 0,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(total_messages)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_running(&self, ids: &[CampaignId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE campaigns SET
                status = 'running',
                started_at = COALESCE(started_at, NOW()),
                updated_at = NOW()
            WHERE id = ANY($1) AND status = 'scheduled'
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_sent(&self, id: CampaignId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent_count = sent_count + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_failed(&self, id: CampaignId) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                failed_count = failed_count + 1,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_draft(&self, id: CampaignId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1 AND status = 'draft'")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
