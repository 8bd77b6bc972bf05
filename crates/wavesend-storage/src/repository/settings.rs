//! Settings repository

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::{Settings, UpdateSettings};
use crate::store::{SettingsStore, StoreError};

/// Settings repository
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    /// Create a new settings repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get_or_default(&self) -> Result<Settings, StoreError> {
        let settings = sqlx::query_as::<_, Settings>(
            r#"
            INSERT INTO settings (id) VALUES ('default')
            ON CONFLICT (id) DO UPDATE SET id = settings.id
            RETURNING *
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn update(&self, input: UpdateSettings) -> Result<Settings, StoreError> {
        // Row is guaranteed to exist before the update
        self.get_or_default().await?;

        let settings = sqlx::query_as::<_, Settings>(
            r#"
            UPDATE settings SET
                api_key = COALESCE($1, api_key),
                default_interval_seconds = COALESCE($2, default_interval_seconds),
                max_messages_per_day = COALESCE($3, max_messages_per_day),
                updated_at = NOW()
            WHERE id = 'default'
            RETURNING *
            "#,
        )
        .bind(&input.api_key)
        .bind(input.default_interval_seconds)
        .bind(input.max_messages_per_day)
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }
}
