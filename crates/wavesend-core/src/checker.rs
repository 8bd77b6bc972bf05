//! Completion Checker - reconciles campaign status from message state
//!
//! Two reconciliations per tick, in a fixed order: a campaign with no
//! outstanding messages is completed, and only a campaign that still
//! has work left can be auto-paused for an excessive failure ratio.

use std::sync::Arc;
use tokio::time::{interval, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use wavesend_common::config::WorkerConfig;
use wavesend_storage::models::{Campaign, CampaignStatus, MessageStatus};
use wavesend_storage::store::{CampaignStore, MessageStore, StoreError};

/// Failure ratio above which a running campaign is paused
const AUTO_PAUSE_RATIO: f64 = 0.5;

/// Periodic campaign reconciler
pub struct CompletionChecker {
    campaigns: Arc<dyn CampaignStore>,
    messages: Arc<dyn MessageStore>,
    checker_interval_secs: u64,
}

impl CompletionChecker {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        messages: Arc<dyn MessageStore>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            campaigns,
            messages,
            checker_interval_secs: config.checker_interval_secs,
        }
    }

    /// Run the reconcile loop until cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(TokioDuration::from_secs(self.checker_interval_secs));

        info!(
            interval_secs = self.checker_interval_secs,
            "completion checker started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        error!("completion check failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("completion checker stopping");
                    break;
                }
            }
        }
    }

    /// Reconcile every running campaign
    pub async fn tick(&self) -> Result<(), StoreError> {
        let running = self
            .campaigns
            .list_by_status(CampaignStatus::Running)
            .await?;

        for campaign in running {
            self.reconcile(&campaign).await?;
        }

        Ok(())
    }

    async fn reconcile(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let outstanding = self
            .messages
            .count_by_campaign_in(campaign.id, &MessageStatus::ACTIVE)
            .await?;

        // Completion strictly before the failure-ratio check: a finished
        // campaign is completed even if more than half of it failed.
        if outstanding == 0 {
            self.campaigns
                .update_status(campaign.id, CampaignStatus::Completed)
                .await?;
            info!(
                campaign_id = %campaign.id,
                sent = campaign.sent_count,
                failed = campaign.failed_count,
                "campaign completed"
            );
            return Ok(());
        }

        if campaign.total_messages == 0 {
            return Ok(());
        }

        // Live count, not the cached counter: the counter can lag the
        // message rows under concurrent updates.
        let failed = self
            .messages
            .count_by_campaign_in(campaign.id, &[MessageStatus::Failed])
            .await?;

        let ratio = failed as f64 / campaign.total_messages as f64;
        if ratio > AUTO_PAUSE_RATIO {
            self.campaigns
                .update_status(campaign.id, CampaignStatus::Paused)
                .await?;
            warn!(
                campaign_id = %campaign.id,
                failed,
                total = campaign.total_messages,
                "failure ratio exceeded, campaign auto-paused"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;
    use wavesend_storage::models::Message;
    use wavesend_storage::MemoryStore;

    fn checker(store: &Arc<MemoryStore>) -> CompletionChecker {
        CompletionChecker::new(store.clone(), store.clone(), &WorkerConfig::default())
    }

    async fn campaign_with_messages(
        store: &Arc<MemoryStore>,
        statuses: &[MessageStatus],
    ) -> Uuid {
        let now = Utc::now();
        let campaign_id = Uuid::new_v4();
        store
            .insert_campaign(Campaign {
                id: campaign_id,
                name: "spring".to_string(),
                message_template: "hi".to_string(),
                contact_list_id: None,
                start_at: now,
                spread_days: 1,
                interval_seconds: 60,
                status: CampaignStatus::Running.to_string(),
                total_messages: statuses.len() as i32,
                sent_count: 0,
                failed_count: 0,
                created_at: now,
                updated_at: now,
                started_at: Some(now),
                completed_at: None,
            })
            .await;

        for status in statuses {
            store
                .insert_message(Message {
                    id: Uuid::new_v4(),
                    campaign_id,
                    contact_id: Uuid::new_v4(),
                    text: "hi".to_string(),
                    scheduled_at: now,
                    status: status.to_string(),
                    retry_count: 0,
                    error_message: None,
                    provider_message_id: None,
                    sent_at: None,
                    created_at: now,
                    updated_at: now,
                })
                .await;
        }

        campaign_id
    }

    #[tokio::test]
    async fn test_campaign_with_no_outstanding_work_completes() {
        let store = Arc::new(MemoryStore::new());
        let id = campaign_with_messages(
            &store,
            &[MessageStatus::Sent, MessageStatus::Sent, MessageStatus::Failed],
        )
        .await;

        checker(&store).tick().await.unwrap();

        let campaign = store.campaign(id).await.unwrap();
        assert_eq!(campaign.status, "completed");
        assert!(campaign.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_beats_auto_pause() {
        // 6 of 10 failed but nothing outstanding: completed, not paused
        let store = Arc::new(MemoryStore::new());
        let mut statuses = vec![MessageStatus::Failed; 6];
        statuses.extend(vec![MessageStatus::Sent; 4]);
        let id = campaign_with_messages(&store, &statuses).await;

        checker(&store).tick().await.unwrap();

        assert_eq!(store.campaign(id).await.unwrap().status, "completed");
    }

    #[tokio::test]
    async fn test_excessive_failures_auto_pause_while_work_remains() {
        let store = Arc::new(MemoryStore::new());
        let mut statuses = vec![MessageStatus::Failed; 6];
        statuses.extend(vec![MessageStatus::Sent; 2]);
        statuses.extend(vec![MessageStatus::Pending; 2]);
        let id = campaign_with_messages(&store, &statuses).await;

        checker(&store).tick().await.unwrap();

        assert_eq!(store.campaign(id).await.unwrap().status, "paused");
    }

    #[tokio::test]
    async fn test_healthy_running_campaign_is_untouched() {
        let store = Arc::new(MemoryStore::new());
        let id = campaign_with_messages(
            &store,
            &[
                MessageStatus::Sent,
                MessageStatus::Failed,
                MessageStatus::Pending,
                MessageStatus::Queued,
            ],
        )
        .await;

        checker(&store).tick().await.unwrap();

        assert_eq!(store.campaign(id).await.unwrap().status, "running");
    }

    #[tokio::test]
    async fn test_exactly_half_failed_does_not_pause() {
        let store = Arc::new(MemoryStore::new());
        let mut statuses = vec![MessageStatus::Failed; 2];
        statuses.extend(vec![MessageStatus::Pending; 2]);
        let id = campaign_with_messages(&store, &statuses).await;

        checker(&store).tick().await.unwrap();

        assert_eq!(store.campaign(id).await.unwrap().status, "running");
    }
}
