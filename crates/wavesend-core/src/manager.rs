//! Campaign Manager - campaign lifecycle state machine
//!
//! Owns the DRAFT → SCHEDULED → RUNNING → PAUSED/COMPLETED/CANCELLED
//! transitions. Activation is the only point where messages are
//! materialized; resuming a paused campaign never regenerates them.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use wavesend_common::types::{CampaignId, ContactId, ContactListId};
use wavesend_storage::models::{
    Campaign, CampaignStatus, Contact, CreateCampaign, CreateMessage,
};
use wavesend_storage::store::{
    CampaignStore, ContactListStore, ContactStore, MessageStore, SettingsStore, StoreError,
};

use crate::schedule::compute_schedule;
use crate::template::resolve_template;

/// Campaign manager errors
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error("Campaign not found")]
    NotFound,

    #[error("Campaign is {status}, cannot {action}")]
    InvalidState { status: String, action: &'static str },

    #[error("Campaign has no contact list")]
    NoContactList,

    #[error("Contact list is empty")]
    EmptyContactList,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Input for a quick send: an immediate one-day campaign
#[derive(Debug, Clone)]
pub struct QuickSendRequest {
    pub name: Option<String>,
    pub text: String,
    pub contact_ids: Vec<ContactId>,
    pub contact_list_id: Option<ContactListId>,
}

/// Campaign Manager
pub struct CampaignManager {
    campaigns: Arc<dyn CampaignStore>,
    messages: Arc<dyn MessageStore>,
    contacts: Arc<dyn ContactStore>,
    contact_lists: Arc<dyn ContactListStore>,
    settings: Arc<dyn SettingsStore>,
}

impl CampaignManager {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        messages: Arc<dyn MessageStore>,
        contacts: Arc<dyn ContactStore>,
        contact_lists: Arc<dyn ContactListStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            campaigns,
            messages,
            contacts,
            contact_lists,
            settings,
        }
    }

    /// Activate a campaign.
    ///
    /// From DRAFT: materializes one PENDING message per contact on the
    /// computed schedule, fixes `total_messages`, zeroes both counters,
    /// and moves to SCHEDULED. From PAUSED: moves straight to RUNNING,
    /// leaving the existing messages (queued and retrying ones included)
    /// to resume processing. Any other state is rejected.
    pub async fn activate(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self
            .campaigns
            .get(id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        match campaign.status_enum() {
            Some(CampaignStatus::Draft) => self.activate_draft(campaign).await,
            Some(CampaignStatus::Paused) => {
                let resumed = self
                    .campaigns
                    .update_status(id, CampaignStatus::Running)
                    .await?
                    .ok_or(CampaignError::NotFound)?;
                info!(campaign_id = %id, "campaign resumed");
                Ok(resumed)
            }
            _ => Err(CampaignError::InvalidState {
                status: campaign.status,
                action: "activate",
            }),
        }
    }

    async fn activate_draft(&self, campaign: Campaign) -> Result<Campaign, CampaignError> {
        let list_id = campaign
            .contact_list_id
            .ok_or(CampaignError::NoContactList)?;

        let contacts = self.contacts.list_by_list(list_id).await?;
        if contacts.is_empty() {
            return Err(CampaignError::EmptyContactList);
        }

        self.materialize_messages(&campaign, &contacts).await?;

        let scheduled = self
            .campaigns
            .get(campaign.id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        info!(
            campaign_id = %campaign.id,
            total = contacts.len(),
            start_at = %campaign.start_at,
            "campaign activated"
        );

        Ok(scheduled)
    }

    /// Compute the schedule, render per-contact text, and create the
    /// whole message batch, then fix the campaign totals and move it to
    /// SCHEDULED.
    async fn materialize_messages(
        &self,
        campaign: &Campaign,
        contacts: &[Contact],
    ) -> Result<(), CampaignError> {
        let contact_ids: Vec<ContactId> = contacts.iter().map(|c| c.id).collect();
        let entries = compute_schedule(
            &contact_ids,
            campaign.start_at,
            campaign.spread_days,
            campaign.interval_seconds,
        );

        let batch: Vec<CreateMessage> = entries
            .iter()
            .zip(contacts.iter())
            .map(|(entry, contact)| CreateMessage {
                campaign_id: campaign.id,
                contact_id: entry.contact_id,
                text: resolve_template(&campaign.message_template, &contact.name, &contact.phone),
                scheduled_at: entry.scheduled_at,
            })
            .collect();

        let total = batch.len() as i32;
        self.messages.create_batch(batch).await?;
        self.campaigns.mark_activated(campaign.id, total).await?;

        Ok(())
    }

    /// Pause a RUNNING or SCHEDULED campaign. Messages are untouched;
    /// jobs already claimed by the worker run to completion, and the
    /// poller's campaign-status guard stops further promotion.
    pub async fn pause(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self
            .campaigns
            .get(id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        match campaign.status_enum() {
            Some(CampaignStatus::Running) | Some(CampaignStatus::Scheduled) => {
                let paused = self
                    .campaigns
                    .update_status(id, CampaignStatus::Paused)
                    .await?
                    .ok_or(CampaignError::NotFound)?;
                info!(campaign_id = %id, "campaign paused");
                Ok(paused)
            }
            _ => Err(CampaignError::InvalidState {
                status: campaign.status,
                action: "pause",
            }),
        }
    }

    /// Cancel any non-terminal campaign, cancelling all of its messages
    /// that have not reached a terminal outcome.
    pub async fn cancel(&self, id: CampaignId) -> Result<Campaign, CampaignError> {
        let campaign = self
            .campaigns
            .get(id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        match campaign.status_enum() {
            Some(status) if !status.is_terminal() => {
                let cancelled_messages = self.messages.cancel_active_by_campaign(id).await?;
                let cancelled = self
                    .campaigns
                    .update_status(id, CampaignStatus::Cancelled)
                    .await?
                    .ok_or(CampaignError::NotFound)?;
                info!(
                    campaign_id = %id,
                    cancelled_messages,
                    "campaign cancelled"
                );
                Ok(cancelled)
            }
            _ => Err(CampaignError::InvalidState {
                status: campaign.status,
                action: "cancel",
            }),
        }
    }

    /// Create and immediately schedule a one-day campaign from an ad-hoc
    /// text and recipient set, spaced by the default interval from
    /// settings.
    pub async fn quick_send(&self, request: QuickSendRequest) -> Result<Campaign, CampaignError> {
        let mut contacts = Vec::new();
        if let Some(list_id) = request.contact_list_id {
            self.contact_lists
                .get(list_id)
                .await?
                .ok_or(CampaignError::NotFound)?;
            contacts.extend(self.contacts.list_by_list(list_id).await?);
        }
        if !request.contact_ids.is_empty() {
            let explicit = self.contacts.get_many(&request.contact_ids).await?;
            for contact in explicit {
                if !contacts.iter().any(|c: &Contact| c.id == contact.id) {
                    contacts.push(contact);
                }
            }
        }
        if contacts.is_empty() {
            return Err(CampaignError::EmptyContactList);
        }

        let settings = self.settings.get_or_default().await?;
        let now = Utc::now();
        let name = request
            .name
            .unwrap_or_else(|| format!("Quick send {}", now.format("%Y-%m-%d %H:%M")));

        let campaign = self
            .campaigns
            .create(CreateCampaign {
                name,
                message_template: request.text,
                contact_list_id: request.contact_list_id,
                start_at: now,
                spread_days: 1,
                interval_seconds: settings.default_interval_seconds,
            })
            .await?;

        self.materialize_messages(&campaign, &contacts).await?;

        let scheduled = self
            .campaigns
            .get(campaign.id)
            .await?
            .ok_or(CampaignError::NotFound)?;

        info!(
            campaign_id = %campaign.id,
            recipients = contacts.len(),
            "quick send scheduled"
        );

        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use wavesend_storage::models::{CreateContact, CreateContactList, MessageStatus};
    use wavesend_storage::MemoryStore;

    fn manager(store: &Arc<MemoryStore>) -> CampaignManager {
        CampaignManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        )
    }

    async fn list_with_contacts(store: &Arc<MemoryStore>, n: usize) -> ContactListId {
        let list = ContactListStore::create(
            store.as_ref(),
            CreateContactList {
                name: "customers".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        for i in 0..n {
            let contact = ContactStore::create(
                store.as_ref(),
                CreateContact {
                    name: format!("Contact {i}"),
                    phone: format!("+3161234567{i}"),
                    notes: None,
                    is_group: false,
                    tags: None,
                },
            )
            .await
            .unwrap();
            store.add_member(list.id, contact.id).await.unwrap();
        }

        list.id
    }

    async fn draft(store: &Arc<MemoryStore>, list_id: ContactListId) -> Campaign {
        CampaignStore::create(
            store.as_ref(),
            CreateCampaign {
                name: "spring".to_string(),
                message_template: "Hi {{name}}".to_string(),
                contact_list_id: Some(list_id),
                start_at: Utc::now(),
                spread_days: 2,
                interval_seconds: 60,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_activate_draft_materializes_messages() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 5).await;
        let campaign = draft(&store, list_id).await;

        let activated = manager(&store).activate(campaign.id).await.unwrap();

        assert_eq!(activated.status, "scheduled");
        assert_eq!(activated.total_messages, 5);
        assert_eq!(activated.sent_count, 0);

        let messages = MessageStore::list(store.as_ref(), Some(campaign.id), None, 100, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 5);
        assert!(messages.iter().all(|m| m.status == "pending"));
        // Template resolved per contact
        assert!(messages.iter().any(|m| m.text == "Hi Contact 0"));

        // 5 contacts over 2 days: slots on two distinct calendar days
        let first = messages.first().unwrap().scheduled_at;
        let last = messages.last().unwrap().scheduled_at;
        assert_eq!(last - first, Duration::days(1) + Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_activate_requires_contacts() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 0).await;
        let campaign = draft(&store, list_id).await;

        let err = manager(&store).activate(campaign.id).await.unwrap_err();
        assert!(matches!(err, CampaignError::EmptyContactList));
        assert_eq!(store.campaign(campaign.id).await.unwrap().status, "draft");
    }

    #[tokio::test]
    async fn test_state_machine_rejections() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 2).await;
        let campaign = draft(&store, list_id).await;
        let m = manager(&store);

        // Pause requires RUNNING or SCHEDULED
        assert!(matches!(
            m.pause(campaign.id).await.unwrap_err(),
            CampaignError::InvalidState { action: "pause", .. }
        ));

        m.activate(campaign.id).await.unwrap();

        // Activate again while scheduled is rejected
        assert!(matches!(
            m.activate(campaign.id).await.unwrap_err(),
            CampaignError::InvalidState { action: "activate", .. }
        ));

        // Terminal states admit nothing
        store
            .update_status(campaign.id, CampaignStatus::Completed)
            .await
            .unwrap();
        assert!(matches!(
            m.cancel(campaign.id).await.unwrap_err(),
            CampaignError::InvalidState { action: "cancel", .. }
        ));
    }

    #[tokio::test]
    async fn test_resume_does_not_regenerate_messages() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 3).await;
        let campaign = draft(&store, list_id).await;
        let m = manager(&store);

        m.activate(campaign.id).await.unwrap();
        store
            .update_status(campaign.id, CampaignStatus::Running)
            .await
            .unwrap();
        m.pause(campaign.id).await.unwrap();

        let resumed = m.activate(campaign.id).await.unwrap();
        assert_eq!(resumed.status, "running");
        assert_eq!(resumed.total_messages, 3);

        let messages = MessageStore::list(store.as_ref(), Some(campaign.id), None, 100, 0)
            .await
            .unwrap();
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn test_cancel_cancels_active_messages() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 3).await;
        let campaign = draft(&store, list_id).await;
        let m = manager(&store);

        m.activate(campaign.id).await.unwrap();

        // One message already delivered stays sent
        let messages = MessageStore::list(store.as_ref(), Some(campaign.id), None, 100, 0)
            .await
            .unwrap();
        store
            .mark_sent(messages[0].id, "prov-1", Utc::now())
            .await
            .unwrap();

        let cancelled = m.cancel(campaign.id).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");
        assert!(cancelled.completed_at.is_some());

        let messages = MessageStore::list(store.as_ref(), Some(campaign.id), None, 100, 0)
            .await
            .unwrap();
        let by_status = |s: &str| messages.iter().filter(|m| m.status == s).count();
        assert_eq!(by_status("sent"), 1);
        assert_eq!(by_status("cancelled"), 2);
    }

    #[tokio::test]
    async fn test_quick_send_schedules_immediately() {
        let store = Arc::new(MemoryStore::new());
        let list_id = list_with_contacts(&store, 2).await;

        let campaign = manager(&store)
            .quick_send(QuickSendRequest {
                name: None,
                text: "Flash sale today".to_string(),
                contact_ids: Vec::new(),
                contact_list_id: Some(list_id),
            })
            .await
            .unwrap();

        assert_eq!(campaign.status, "scheduled");
        assert_eq!(campaign.spread_days, 1);
        assert_eq!(campaign.total_messages, 2);
        // Default interval comes from settings
        assert_eq!(campaign.interval_seconds, 300);

        let messages = MessageStore::list(store.as_ref(), Some(campaign.id), None, 100, 0)
            .await
            .unwrap();
        assert_eq!(messages[1].scheduled_at - messages[0].scheduled_at, Duration::seconds(300));
    }

    #[tokio::test]
    async fn test_quick_send_with_no_recipients_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let err = manager(&store)
            .quick_send(QuickSendRequest {
                name: None,
                text: "hello".to_string(),
                contact_ids: Vec::new(),
                contact_list_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CampaignError::EmptyContactList));
    }
}
