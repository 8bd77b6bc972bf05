//! Store traits - the persistence contract the delivery pipeline is
//! written against.
//!
//! The Postgres repositories in [`crate::repository`] implement these
//! traits for production; [`crate::memory::MemoryStore`] implements them
//! for deterministic tests. Components hold `Arc<dyn ...>` handles so the
//! two are interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use wavesend_common::types::{CampaignId, ContactId, ContactListId, MessageId};

use crate::models::{
    Campaign, CampaignStatus, Contact, ContactList, CreateCampaign, CreateContact,
    CreateContactList, CreateMessage, DispatchJob, Message, MessageStatus, Settings,
    UpdateContact, UpdateSettings,
};

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Campaign persistence operations
#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign, StoreError>;

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError>;

    async fn list(
        &self,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, StoreError>;

    /// All campaigns currently in the given status
    async fn list_by_status(&self, status: CampaignStatus)
        -> Result<Vec<Campaign>, StoreError>;

    /// Set the campaign status, stamping started_at / completed_at for the
    /// states that carry them
    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, StoreError>;

    /// Transition from DRAFT to SCHEDULED at activation: fixes
    /// total_messages and zeroes both counters in one update
    async fn mark_activated(&self, id: CampaignId, total_messages: i32)
        -> Result<(), StoreError>;

    /// Promote the given campaigns from SCHEDULED to RUNNING; campaigns in
    /// any other status are untouched
    async fn mark_running(&self, ids: &[CampaignId]) -> Result<(), StoreError>;

    /// Atomic `sent_count = sent_count + 1`
    async fn increment_sent(&self, id: CampaignId) -> Result<(), StoreError>;

    /// Atomic `failed_count = failed_count + 1`
    async fn increment_failed(&self, id: CampaignId) -> Result<(), StoreError>;

    /// Delete a campaign; only drafts may be deleted
    async fn delete_draft(&self, id: CampaignId) -> Result<bool, StoreError>;
}

/// Message persistence operations
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Create all messages of an activation in one logical operation
    async fn create_batch(&self, messages: Vec<CreateMessage>) -> Result<u64, StoreError>;

    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    async fn list(
        &self,
        campaign_id: Option<CampaignId>,
        status: Option<MessageStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, StoreError>;

    /// Due messages: status PENDING, scheduled_at <= now, owning campaign
    /// SCHEDULED or RUNNING; ascending scheduled_at, bounded by `limit`
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError>;

    /// PENDING -> QUEUED; returns false if the message was no longer pending
    async fn mark_queued(&self, id: MessageId) -> Result<bool, StoreError>;

    async fn mark_sending(&self, id: MessageId) -> Result<(), StoreError>;

    async fn mark_sent(
        &self,
        id: MessageId,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Increment retry_count, record the error, status RETRY
    async fn mark_retry(&self, id: MessageId, error: &str) -> Result<(), StoreError>;

    /// Terminal failure: status FAILED with the error recorded
    async fn mark_failed(&self, id: MessageId, error: &str) -> Result<(), StoreError>;

    /// PENDING/QUEUED/RETRY -> CANCELLED for a whole campaign; returns the
    /// number of messages cancelled
    async fn cancel_active_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError>;

    /// Count a campaign's messages in any of the given statuses
    async fn count_by_campaign_in(
        &self,
        campaign_id: CampaignId,
        statuses: &[MessageStatus],
    ) -> Result<i64, StoreError>;
}

/// Durable dispatch job operations. The job key is the message id.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a pending job for the message unless one already exists.
    /// Returns false when the key was already present (idempotent enqueue).
    async fn enqueue(
        &self,
        message_id: MessageId,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Claim the earliest pending job whose next_attempt_at has passed,
    /// marking it processing
    async fn claim_next_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DispatchJob>, StoreError>;

    async fn complete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Put a retryable job back to pending with updated attempt count,
    /// error, and next-eligible time
    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError>;
}

/// Contact persistence operations
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, input: CreateContact) -> Result<Contact, StoreError>;

    async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError>;

    async fn get_many(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError>;

    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, StoreError>;

    async fn update(
        &self,
        id: ContactId,
        input: UpdateContact,
    ) -> Result<Option<Contact>, StoreError>;

    async fn delete(&self, id: ContactId) -> Result<bool, StoreError>;

    /// Members of a contact list in insertion order
    async fn list_by_list(&self, list_id: ContactListId) -> Result<Vec<Contact>, StoreError>;
}

/// Contact list persistence operations
#[async_trait]
pub trait ContactListStore: Send + Sync {
    async fn create(&self, input: CreateContactList) -> Result<ContactList, StoreError>;

    async fn get(&self, id: ContactListId) -> Result<Option<ContactList>, StoreError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ContactList>, StoreError>;

    async fn delete(&self, id: ContactListId) -> Result<bool, StoreError>;

    /// Add a contact to a list; returns false if already a member
    async fn add_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError>;

    async fn remove_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError>;

    async fn member_count(&self, list_id: ContactListId) -> Result<i64, StoreError>;
}

/// Settings persistence. Exposes the current delivery credential and the
/// campaign defaults; the worker re-reads these per job.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_or_default(&self) -> Result<Settings, StoreError>;

    async fn update(&self, input: UpdateSettings) -> Result<Settings, StoreError>;
}
