//! In-memory store
//!
//! Implements every store trait over a single `RwLock`ed state. Used by
//! the pipeline tests, where the clock is passed in explicitly, and
//! handy for local experiments without a Postgres instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use wavesend_common::types::{CampaignId, ContactId, ContactListId, MessageId};

use crate::models::{
    Campaign, CampaignStatus, Contact, ContactList, CreateCampaign, CreateContact,
    CreateContactList, CreateMessage, DispatchJob, Message, MessageStatus, Settings,
    UpdateContact, UpdateSettings,
};
use crate::store::{
    CampaignStore, ContactListStore, ContactStore, JobStore, MessageStore, SettingsStore,
    StoreError,
};

#[derive(Default)]
struct State {
    campaigns: HashMap<CampaignId, Campaign>,
    messages: HashMap<MessageId, Message>,
    jobs: HashMap<Uuid, DispatchJob>,
    contacts: HashMap<ContactId, Contact>,
    lists: HashMap<ContactListId, ContactList>,
    // (list, contact) pairs in insertion order
    members: Vec<(ContactListId, ContactId)>,
    settings: Option<Settings>,
}

/// In-memory implementation of all store traits
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read of a message, for test assertions
    pub async fn message(&self, id: MessageId) -> Option<Message> {
        self.state.read().await.messages.get(&id).cloned()
    }

    /// Direct read of a campaign, for test assertions
    pub async fn campaign(&self, id: CampaignId) -> Option<Campaign> {
        self.state.read().await.campaigns.get(&id).cloned()
    }

    /// Number of job rows, for test assertions
    pub async fn job_count(&self) -> usize {
        self.state.read().await.jobs.len()
    }

    /// Insert a fully-formed campaign row, for test setup
    pub async fn insert_campaign(&self, campaign: Campaign) {
        self.state
            .write()
            .await
            .campaigns
            .insert(campaign.id, campaign);
    }

    /// Insert a fully-formed message row, for test setup
    pub async fn insert_message(&self, message: Message) {
        self.state
            .write()
            .await
            .messages
            .insert(message.id, message);
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign, StoreError> {
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: input.name,
            message_template: input.message_template,
            contact_list_id: input.contact_list_id,
            start_at: input.start_at,
            spread_days: input.spread_days,
            interval_seconds: input.interval_seconds,
            status: CampaignStatus::Draft.to_string(),
            total_messages: 0,
            sent_count: 0,
            failed_count: 0,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };
        self.state
            .write()
            .await
            .campaigns
            .insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, StoreError> {
        Ok(self.state.read().await.campaigns.get(&id).cloned())
    }

    async fn list(
        &self,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, StoreError> {
        let state = self.state.read().await;
        let mut campaigns: Vec<Campaign> = state
            .campaigns
            .values()
            .filter(|c| status.map_or(true, |s| c.status == s.to_string()))
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_by_status(
        &self,
        status: CampaignStatus,
    ) -> Result<Vec<Campaign>, StoreError> {
        let state = self.state.read().await;
        let mut campaigns: Vec<Campaign> = state
            .campaigns
            .values()
            .filter(|c| c.status == status.to_string())
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(campaigns)
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, StoreError> {
        let mut state = self.state.write().await;
        let Some(campaign) = state.campaigns.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();
        campaign.status = status.to_string();
        campaign.updated_at = now;
        if status == CampaignStatus::Running && campaign.started_at.is_none() {
            campaign.started_at = Some(now);
        }
        if status.is_terminal() && campaign.completed_at.is_none() {
            campaign.completed_at = Some(now);
        }
        Ok(Some(campaign.clone()))
    }

    async fn mark_activated(
        &self,
        id: CampaignId,
        total_messages: i32,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(campaign) = state.campaigns.get_mut(&id) {
            campaign.status = CampaignStatus::Scheduled.to_string();
            campaign.total_messages = total_messages;
            campaign.sent_count = 0;
            campaign.failed_count = 0;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_running(&self, ids: &[CampaignId]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        for id in ids {
            if let Some(campaign) = state.campaigns.get_mut(id) {
                if campaign.status == CampaignStatus::Scheduled.to_string() {
                    campaign.status = CampaignStatus::Running.to_string();
                    campaign.started_at.get_or_insert(now);
                    campaign.updated_at = now;
                }
            }
        }
        Ok(())
    }

    async fn increment_sent(&self, id: CampaignId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(campaign) = state.campaigns.get_mut(&id) {
            campaign.sent_count += 1;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn increment_failed(&self, id: CampaignId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(campaign) = state.campaigns.get_mut(&id) {
            campaign.failed_count += 1;
            campaign.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_draft(&self, id: CampaignId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let is_draft = state
            .campaigns
            .get(&id)
            .map_or(false, |c| c.status == CampaignStatus::Draft.to_string());
        if is_draft {
            state.campaigns.remove(&id);
            state.messages.retain(|_, m| m.campaign_id != id);
        }
        Ok(is_draft)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn create_batch(&self, messages: Vec<CreateMessage>) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let count = messages.len() as u64;
        for input in messages {
            let message = Message {
                id: Uuid::new_v4(),
                campaign_id: input.campaign_id,
                contact_id: input.contact_id,
                text: input.text,
                scheduled_at: input.scheduled_at,
                status: MessageStatus::Pending.to_string(),
                retry_count: 0,
                error_message: None,
                provider_message_id: None,
                sent_at: None,
                created_at: now,
                updated_at: now,
            };
            state.messages.insert(message.id, message);
        }
        Ok(count)
    }

    async fn get(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.state.read().await.messages.get(&id).cloned())
    }

    async fn list(
        &self,
        campaign_id: Option<CampaignId>,
        status: Option<MessageStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|m| campaign_id.map_or(true, |c| m.campaign_id == c))
            .filter(|m| status.map_or(true, |s| m.status == s.to_string()))
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        Ok(messages
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Message>, StoreError> {
        let state = self.state.read().await;
        let mut due: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.status == MessageStatus::Pending.to_string())
            .filter(|m| m.scheduled_at <= now)
            .filter(|m| {
                state.campaigns.get(&m.campaign_id).map_or(false, |c| {
                    c.status == CampaignStatus::Scheduled.to_string()
                        || c.status == CampaignStatus::Running.to_string()
                })
            })
            .cloned()
            .collect();
        due.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at));
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn mark_queued(&self, id: MessageId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let Some(message) = state.messages.get_mut(&id) else {
            return Ok(false);
        };
        if message.status != MessageStatus::Pending.to_string() {
            return Ok(false);
        }
        message.status = MessageStatus::Queued.to_string();
        message.updated_at = Utc::now();
        Ok(true)
    }

    async fn mark_sending(&self, id: MessageId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.get_mut(&id) {
            message.status = MessageStatus::Sending.to_string();
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_sent(
        &self,
        id: MessageId,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.get_mut(&id) {
            message.status = MessageStatus::Sent.to_string();
            message.provider_message_id = Some(provider_message_id.to_string());
            message.sent_at = Some(sent_at);
            message.error_message = None;
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_retry(&self, id: MessageId, error: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.get_mut(&id) {
            message.status = MessageStatus::Retry.to_string();
            message.retry_count += 1;
            message.error_message = Some(error.to_string());
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: MessageId, error: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(message) = state.messages.get_mut(&id) {
            message.status = MessageStatus::Failed.to_string();
            message.error_message = Some(error.to_string());
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn cancel_active_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut cancelled = 0u64;
        for message in state.messages.values_mut() {
            if message.campaign_id != campaign_id {
                continue;
            }
            let active = message.status == MessageStatus::Pending.to_string()
                || message.status == MessageStatus::Queued.to_string()
                || message.status == MessageStatus::Retry.to_string();
            if active {
                message.status = MessageStatus::Cancelled.to_string();
                message.updated_at = now;
                cancelled += 1;
            }
        }
        Ok(cancelled)
    }

    async fn count_by_campaign_in(
        &self,
        campaign_id: CampaignId,
        statuses: &[MessageStatus],
    ) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        let names: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        Ok(state
            .messages
            .values()
            .filter(|m| m.campaign_id == campaign_id && names.contains(&m.status))
            .count() as i64)
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn enqueue(
        &self,
        message_id: MessageId,
        max_attempts: i32,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.jobs.values().any(|j| j.message_id == message_id) {
            return Ok(false);
        }
        let job = DispatchJob {
            id: Uuid::now_v7(),
            message_id,
            status: "pending".to_string(),
            attempts: 0,
            max_attempts,
            next_attempt_at: now,
            last_error: None,
            created_at: now,
            completed_at: None,
        };
        state.jobs.insert(job.id, job);
        Ok(true)
    }

    async fn claim_next_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DispatchJob>, StoreError> {
        let mut state = self.state.write().await;
        let Some(job) = state
            .jobs
            .values_mut()
            .filter(|j| j.status == "pending" && j.next_attempt_at <= now)
            .min_by_key(|j| j.next_attempt_at)
        else {
            return Ok(None);
        };
        job.status = "processing".to_string();
        Ok(Some(job.clone()))
    }

    async fn complete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = "completed".to_string();
            job.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        attempts: i32,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = "pending".to_string();
            job.attempts = attempts;
            job.last_error = Some(error.to_string());
            job.next_attempt_at = next_attempt_at;
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = "failed".to_string();
            job.last_error = Some(error.to_string());
            job.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn create(&self, input: CreateContact) -> Result<Contact, StoreError> {
        let now = Utc::now();
        let contact = Contact {
            id: Uuid::new_v4(),
            name: input.name,
            phone: input.phone,
            notes: input.notes,
            is_group: input.is_group,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };
        self.state
            .write()
            .await
            .contacts
            .insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn get(&self, id: ContactId) -> Result<Option<Contact>, StoreError> {
        Ok(self.state.read().await.contacts.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[ContactId]) -> Result<Vec<Contact>, StoreError> {
        let state = self.state.read().await;
        let mut contacts: Vec<Contact> = ids
            .iter()
            .filter_map(|id| state.contacts.get(id).cloned())
            .collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contacts)
    }

    async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contact>, StoreError> {
        let state = self.state.read().await;
        let needle = search.map(|s| s.to_lowercase());
        let mut contacts: Vec<Contact> = state
            .contacts
            .values()
            .filter(|c| {
                needle.as_ref().map_or(true, |n| {
                    c.name.to_lowercase().contains(n) || c.phone.contains(n.as_str())
                })
            })
            .cloned()
            .collect();
        contacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(contacts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn update(
        &self,
        id: ContactId,
        input: UpdateContact,
    ) -> Result<Option<Contact>, StoreError> {
        let mut state = self.state.write().await;
        let Some(contact) = state.contacts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = input.name {
            contact.name = name;
        }
        if let Some(phone) = input.phone {
            contact.phone = phone;
        }
        if let Some(notes) = input.notes {
            contact.notes = Some(notes);
        }
        if let Some(is_group) = input.is_group {
            contact.is_group = is_group;
        }
        if let Some(tags) = input.tags {
            contact.tags = Some(tags);
        }
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete(&self, id: ContactId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let existed = state.contacts.remove(&id).is_some();
        state.members.retain(|(_, c)| *c != id);
        Ok(existed)
    }

    async fn list_by_list(&self, list_id: ContactListId) -> Result<Vec<Contact>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .members
            .iter()
            .filter(|(l, _)| *l == list_id)
            .filter_map(|(_, c)| state.contacts.get(c).cloned())
            .collect())
    }
}

#[async_trait]
impl ContactListStore for MemoryStore {
    async fn create(&self, input: CreateContactList) -> Result<ContactList, StoreError> {
        let now = Utc::now();
        let list = ContactList {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn get(&self, id: ContactListId) -> Result<Option<ContactList>, StoreError> {
        Ok(self.state.read().await.lists.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ContactList>, StoreError> {
        let state = self.state.read().await;
        let mut lists: Vec<ContactList> = state.lists.values().cloned().collect();
        lists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(lists
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn delete(&self, id: ContactListId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let existed = state.lists.remove(&id).is_some();
        state.members.retain(|(l, _)| *l != id);
        Ok(existed)
    }

    async fn add_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.members.contains(&(list_id, contact_id)) {
            return Ok(false);
        }
        state.members.push((list_id, contact_id));
        Ok(true)
    }

    async fn remove_member(
        &self,
        list_id: ContactListId,
        contact_id: ContactId,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.members.len();
        state.members.retain(|m| *m != (list_id, contact_id));
        Ok(state.members.len() < before)
    }

    async fn member_count(&self, list_id: ContactListId) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        Ok(state.members.iter().filter(|(l, _)| *l == list_id).count() as i64)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_or_default(&self) -> Result<Settings, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.settings.get_or_insert_with(Settings::default).clone())
    }

    async fn update(&self, input: UpdateSettings) -> Result<Settings, StoreError> {
        let mut state = self.state.write().await;
        let settings = state.settings.get_or_insert_with(Settings::default);
        if let Some(api_key) = input.api_key {
            settings.api_key = Some(api_key);
        }
        if let Some(interval) = input.default_interval_seconds {
            settings.default_interval_seconds = interval;
        }
        if let Some(max) = input.max_messages_per_day {
            settings.max_messages_per_day = max;
        }
        settings.updated_at = Utc::now();
        Ok(settings.clone())
    }
}
