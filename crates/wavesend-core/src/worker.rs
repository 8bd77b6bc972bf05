//! Delivery Worker - drains the dispatch queue, one send at a time
//!
//! Global send concurrency is 1: the worker claims a single job,
//! delivers it, then sleeps the minimum spacing before the next claim.
//! Bursts of due messages therefore drain serially even when the
//! provider itself would accept more.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wavesend_common::config::{DeliveryConfig, WorkerConfig};
use wavesend_storage::models::{DispatchJob, Message, MessageStatus};
use wavesend_storage::store::{
    CampaignStore, ContactStore, MessageStore, SettingsStore, StoreError,
};

use crate::delivery::{DeliveryApi, RateLimitInfo};
use crate::queue::DispatchQueue;

const IDLE_SLEEP: StdDuration = StdDuration::from_secs(1);

/// What one claim attempt did
#[derive(Debug)]
pub enum WorkOutcome {
    /// No job was due
    Idle,
    /// A job was processed; `quota_pause` carries the provider-requested
    /// reset delay when remaining quota ran low
    Processed { quota_pause: Option<StdDuration> },
}

/// Serial delivery worker
pub struct DeliveryWorker {
    messages: Arc<dyn MessageStore>,
    campaigns: Arc<dyn CampaignStore>,
    contacts: Arc<dyn ContactStore>,
    settings: Arc<dyn SettingsStore>,
    queue: DispatchQueue,
    api: Arc<dyn DeliveryApi>,
    fallback_api_key: Option<String>,
    max_attempts: i32,
    send_spacing: StdDuration,
    low_quota_threshold: i64,
}

impl DeliveryWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        messages: Arc<dyn MessageStore>,
        campaigns: Arc<dyn CampaignStore>,
        contacts: Arc<dyn ContactStore>,
        settings: Arc<dyn SettingsStore>,
        queue: DispatchQueue,
        api: Arc<dyn DeliveryApi>,
        delivery: &DeliveryConfig,
        worker: &WorkerConfig,
    ) -> Self {
        Self {
            messages,
            campaigns,
            contacts,
            settings,
            queue,
            api,
            fallback_api_key: delivery.api_key.clone(),
            max_attempts: worker.max_attempts,
            send_spacing: StdDuration::from_secs(worker.send_spacing_secs),
            low_quota_threshold: worker.low_quota_threshold,
        }
    }

    /// Run the worker loop until cancelled. No per-job error escapes the
    /// loop; store errors are logged and the claim retried after the
    /// idle sleep.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            spacing_secs = self.send_spacing.as_secs(),
            max_attempts = self.max_attempts,
            "delivery worker started"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("delivery worker stopping");
                break;
            }

            let pause = match self.process_next(Utc::now()).await {
                Ok(WorkOutcome::Idle) => IDLE_SLEEP,
                Ok(WorkOutcome::Processed { quota_pause }) => {
                    self.send_spacing + quota_pause.unwrap_or_default()
                }
                Err(e) => {
                    error!("delivery worker store error: {}", e);
                    IDLE_SLEEP
                }
            };

            tokio::select! {
                _ = sleep(pause) => {}
                _ = shutdown.cancelled() => {
                    info!("delivery worker stopping");
                    break;
                }
            }
        }
    }

    /// Claim and process at most one due job
    pub async fn process_next(&self, now: DateTime<Utc>) -> Result<WorkOutcome, StoreError> {
        let Some(job) = self.queue.claim_next_due(now).await? else {
            return Ok(WorkOutcome::Idle);
        };

        let rate_limit = self.process_job(&job, now).await?;

        let quota_pause = rate_limit.and_then(|info| {
            let remaining = info.remaining?;
            if remaining < self.low_quota_threshold {
                let reset = info.reset_after_secs.unwrap_or(0);
                warn!(remaining, reset_secs = reset, "provider quota low, backing off");
                Some(StdDuration::from_secs(reset))
            } else {
                None
            }
        });

        Ok(WorkOutcome::Processed { quota_pause })
    }

    /// One delivery attempt. Returns the provider's rate-limit feedback
    /// when a send actually happened.
    async fn process_job(
        &self,
        job: &DispatchJob,
        now: DateTime<Utc>,
    ) -> Result<Option<RateLimitInfo>, StoreError> {
        // A message that settled after its job was enqueued is a silent
        // no-op, not an error. This also covers jobs requeued across a
        // restart: a SENT or FAILED message is never delivered again.
        let Some(message) = self.messages.get(job.message_id).await? else {
            debug!(message_id = %job.message_id, "message gone, dropping job");
            self.queue.complete(job).await?;
            return Ok(None);
        };
        if matches!(
            message.status_enum(),
            Some(MessageStatus::Sent | MessageStatus::Failed | MessageStatus::Cancelled)
        ) {
            debug!(
                message_id = %message.id,
                status = %message.status,
                "message already settled, dropping job"
            );
            self.queue.complete(job).await?;
            return Ok(None);
        }

        self.messages.mark_sending(message.id).await?;

        let settings = self.settings.get_or_default().await?;
        let api_key = settings.api_key.or_else(|| self.fallback_api_key.clone());
        let Some(api_key) = api_key else {
            // Configuration errors are terminal immediately and do not
            // consume the retry budget.
            self.fail_terminally(job, &message, "No delivery API key configured")
                .await?;
            return Ok(None);
        };

        let Some(contact) = self.contacts.get(message.contact_id).await? else {
            self.fail_terminally(job, &message, "Recipient contact no longer exists")
                .await?;
            return Ok(None);
        };

        match self.api.send(&api_key, &contact.phone, &message.text).await {
            Ok(receipt) => {
                self.messages
                    .mark_sent(message.id, &receipt.provider_message_id, now)
                    .await?;
                self.campaigns.increment_sent(message.campaign_id).await?;
                self.queue.complete(job).await?;
                info!(
                    message_id = %message.id,
                    campaign_id = %message.campaign_id,
                    provider_message_id = %receipt.provider_message_id,
                    "message sent"
                );
                Ok(Some(receipt.rate_limit))
            }
            Err(e) if e.is_retryable() => {
                self.handle_retryable_failure(job, &message, &e.to_string(), now)
                    .await?;
                Ok(None)
            }
            Err(e) => {
                self.fail_terminally(job, &message, &e.to_string()).await?;
                Ok(None)
            }
        }
    }

    async fn handle_retryable_failure(
        &self,
        job: &DispatchJob,
        message: &Message,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if message.retry_count < self.max_attempts {
            self.messages.mark_retry(message.id, error).await?;
            self.queue.retry(job, error, now).await?;
            warn!(
                message_id = %message.id,
                retry = message.retry_count + 1,
                error,
                "delivery failed, will retry"
            );
        } else {
            self.fail_terminally(job, message, error).await?;
        }
        Ok(())
    }

    async fn fail_terminally(
        &self,
        job: &DispatchJob,
        message: &Message,
        error: &str,
    ) -> Result<(), StoreError> {
        self.messages.mark_failed(message.id, error).await?;
        self.campaigns.increment_failed(message.campaign_id).await?;
        self.queue.fail(job, error).await?;
        warn!(
            message_id = %message.id,
            campaign_id = %message.campaign_id,
            error,
            "message failed"
        );
        Ok(())
    }
}
