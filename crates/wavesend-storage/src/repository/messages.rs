//! Message repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use wavesend_common::types::{CampaignId, MessageId};

use crate::models::{CreateMessage, Message, MessageStatus};
use crate::store::{MessageStore, StoreError};

/// Message repository
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn create_batch(&self, messages: Vec<CreateMessage>) -> Result<u64, StoreError> {
        let mut count = 0u64;
        let mut tx = self.pool.begin().await?;

        for input in messages {
            let result = sqlx::query(
                r#"
                INSERT INTO messages (id, campaign_id, contact_id, text, scheduled_at, status)
                VALUES ($1, $2, $3, $4, $5, 'pending')
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(input.campaign_id)
            .bind(input.contact_id)
            .bind(&input.text)
            .bind(input.scheduled_at)
            .execute(&mut *tx)
            .await?;

            count += result.rows_affected();
        }

        tx.commit().await?;
        Ok(count)
    }

    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    async fn list(
        &self,
        campaign_id: Option<CampaignId>,
        status: Option<MessageStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE ($1::uuid IS NULL OR campaign_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY scheduled_at ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(campaign_id)
        .bind(status.map(|s| s.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT m.* FROM messages m
            JOIN campaigns c ON c.id = m.campaign_id
            WHERE m.status = 'pending'
              AND m.scheduled_at <= $1
              AND c.status IN ('scheduled', 'running')
            ORDER BY m.scheduled_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(messages)
    }

    async fn mark_queued(&self, id: MessageId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET status = 'queued', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_sending(&self, id: MessageId) -> Result<(), StoreError> {
        sqlx::query("UPDATE messages SET status = 'sending', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_sent(
        &self,
        id: MessageId,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE messages SET
                status = 'sent',
                provider_message_id = $2,
                sent_at = $3,
                error_message = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(provider_message_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_retry(&self, id: MessageId, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE messages SET
                status = 'retry',
                retry_count = retry_count + 1,
                error_message = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_failed(&self, id: MessageId, error: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE messages SET
                status = 'failed',
                error_message = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn cancel_active_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET status = 'cancelled', updated_at = NOW()
            WHERE campaign_id = $1 AND status IN ('pending', 'queued', 'retry')
            "#,
        )
        .bind(campaign_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_by_campaign_in(
        &self,
        campaign_id: CampaignId,
        statuses: &[MessageStatus],
    ) -> Result<i64, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM messages WHERE campaign_id = $1 AND status = ANY($2)",
        )
        .bind(campaign_id)
        .bind(&statuses)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}
