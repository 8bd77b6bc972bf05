//! Contact list repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use wavesend_common::types::{ContactId, ContactListId};

use crate::models::{ContactList, CreateContactList};
use crate::store::{ContactListStore, StoreError};

/// Contact list repository
#[derive(Clone)]
pub struct ContactListRepository {
    pool: PgPool,
}

impl ContactListRepository {
    /// Create a new contact list repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactListStore for ContactListRepository {
    async fn create(&self, input: CreateContactList) -> Result<ContactList, StoreError> {
        let list = sqlx::query_as::<_, ContactList>(
            r#"
            INSERT INTO contact_lists (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(list)
    }

    async fn get(&self, id: ContactListId) -> Result<Option<ContactList>, StoreError> {
        let list = sqlx::query_as::<_, ContactList>("SELECT * FROM contact_lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ContactList>, StoreError> {
        let lists = sqlx::query_as::<_, ContactList>(
            "SELECT * FROM contact_lists ORDER BY name ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn delete(&self, id: ContactListId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM contact_lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO contact_list_members (contact_list_id, contact_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(list_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM contact_list_members WHERE contact_list_id = $1 AND contact_id = $2",
        )
        .bind(list_id)
        .bind(contact_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn member_count(&self, list_id: ContactListId) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contact_list_members WHERE contact_list_id = $1",
        )
        .bind(list_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}
