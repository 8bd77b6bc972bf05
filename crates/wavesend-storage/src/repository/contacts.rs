//! Contact repository

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;
use wavesend_common::types::{ContactId, ContactListId};

use crate::models::{Contact, CreateContact, UpdateContact};
use crate::store::{ContactStore, StoreError};

/// Contact repository
#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    /// Create a new contact repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn create(&self, input: CreateContact) -> Result<Contact, StoreError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (id, name, phone, notes, is_group, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.notes)
        .bind(input.is_group)
        .bind(&input.tags)
        .fetch_one(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError> {
        let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn get_many(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError> {
        let contacts = sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE id = ANY($1) ORDER BY name ASC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let contacts = if let Some(search) = search {
            let pattern = format!("%{}%", search);
            sqlx::query_as::<_, Contact>(
                r#"
                SELECT * FROM contacts
                WHERE name ILIKE $1 OR phone LIKE $1
                ORDER BY name ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Contact>(
                "SELECT * FROM contacts ORDER BY name ASC LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(contacts)
    }

    async fn update(
        &self,
        id: ContactId,
        input: UpdateContact,
    ) -> Result<Option<Contact>, StoreError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                notes = COALESCE($4, notes),
                is_group = COALESCE($5, is_group),
                tags = COALESCE($6, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.notes)
        .bind(input.is_group)
        .bind(&input.tags)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn delete(&self, id: ContactId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_list(&self, list_id: ContactListId) -> Result<Vec<Contact>, StoreError> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT c.* FROM contacts c
            JOIN contact_list_members m ON m.contact_id = c.id
            WHERE m.contact_list_id = $1
            ORDER BY m.added_at ASC
            "#,
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }
}
