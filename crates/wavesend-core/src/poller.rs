//! Poller - promotes due messages into the dispatch queue
//!
//! Stateless across ticks: everything it needs lives in the store, so a
//! failed tick simply leaves its messages PENDING for the next one.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::{interval, Duration as TokioDuration};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use wavesend_common::config::WorkerConfig;
use wavesend_common::types::CampaignId;
use wavesend_storage::store::{CampaignStore, MessageStore, StoreError};

use crate::queue::DispatchQueue;

/// Due-message poller
pub struct Poller {
    campaigns: Arc<dyn CampaignStore>,
    messages: Arc<dyn MessageStore>,
    queue: DispatchQueue,
    poll_interval_secs: u64,
    batch_size: i64,
}

impl Poller {
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        messages: Arc<dyn MessageStore>,
        queue: DispatchQueue,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            campaigns,
            messages,
            queue,
            poll_interval_secs: config.poll_interval_secs,
            batch_size: config.poll_batch_size,
        }
    }

    /// Run the poll loop until cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(TokioDuration::from_secs(self.poll_interval_secs));

        info!(
            interval_secs = self.poll_interval_secs,
            batch_size = self.batch_size,
            "poller started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("poll tick failed: {}", e);
                    }
                }
                _ = shutdown.cancelled() => {
                    info!("poller stopping");
                    break;
                }
            }
        }
    }

    /// One poll pass: find due messages, enqueue a job per message, mark
    /// them queued, and promote their campaigns from SCHEDULED to
    /// RUNNING. A store error aborts the tick; messages not yet touched
    /// stay PENDING and are picked up next tick.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let due = self.messages.find_due(now, self.batch_size).await?;
        if due.is_empty() {
            return Ok(0);
        }

        debug!(count = due.len(), "found due messages");

        let mut enqueued = 0usize;
        let mut touched_campaigns: HashSet<CampaignId> = HashSet::new();

        for message in &due {
            // Job key is the message id, so a re-tick over a message
            // that already has a job is a no-op.
            self.queue.enqueue(message.id, now).await?;

            if self.messages.mark_queued(message.id).await? {
                enqueued += 1;
                touched_campaigns.insert(message.campaign_id);
            }
        }

        if !touched_campaigns.is_empty() {
            let ids: Vec<CampaignId> = touched_campaigns.into_iter().collect();
            self.campaigns.mark_running(&ids).await?;
        }

        if enqueued > 0 {
            info!(enqueued, "messages promoted to dispatch queue");
        }

        Ok(enqueued)
    }
}
