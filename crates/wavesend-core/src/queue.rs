//! Dispatch Queue - durable delivery jobs with retry/backoff
//!
//! Jobs live in the store (one row per message, keyed by message id),
//! so a restart resumes from whatever was queued. The message status
//! mirrors the job's last outcome for observability; retry accounting
//! itself belongs to the job.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use wavesend_common::types::MessageId;
use wavesend_storage::models::DispatchJob;
use wavesend_storage::store::{JobStore, StoreError};

/// Next-attempt delay for a retry: `base_delay * 2^attempt`
pub fn backoff_delay(base_delay_secs: i64, attempt: i32) -> Duration {
    let factor = 2i64.saturating_pow(attempt.max(0) as u32);
    Duration::seconds(base_delay_secs.saturating_mul(factor))
}

/// Handle to the durable dispatch queue
#[derive(Clone)]
pub struct DispatchQueue {
    jobs: Arc<dyn JobStore>,
    max_attempts: i32,
    retry_base_delay_secs: i64,
}

impl DispatchQueue {
    pub fn new(jobs: Arc<dyn JobStore>, max_attempts: i32, retry_base_delay_secs: i64) -> Self {
        Self {
            jobs,
            max_attempts,
            retry_base_delay_secs,
        }
    }

    /// Enqueue a delivery job for the message. The message id is the job
    /// key: enqueueing a message that already has a job is a no-op and
    /// returns false.
    pub async fn enqueue(
        &self,
        message_id: MessageId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.jobs.enqueue(message_id, self.max_attempts, now).await
    }

    /// Claim the earliest due job, marking it processing. The worker is
    /// the sole consumer, so at most one job is in flight at a time.
    pub async fn claim_next_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<DispatchJob>, StoreError> {
        self.jobs.claim_next_due(now).await
    }

    pub async fn complete(&self, job: &DispatchJob) -> Result<(), StoreError> {
        self.jobs.complete(job.id).await
    }

    /// Put a job back to pending after a retryable failure, eligible
    /// again after the exponential backoff delay.
    pub async fn retry(
        &self,
        job: &DispatchJob,
        error: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let attempts = job.attempts + 1;
        let next_attempt_at = now + backoff_delay(self.retry_base_delay_secs, job.attempts);
        self.jobs
            .reschedule(job.id, attempts, error, next_attempt_at)
            .await
    }

    pub async fn fail(&self, job: &DispatchJob, error: &str) -> Result<(), StoreError> {
        self.jobs.fail(job.id, error).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;
    use wavesend_storage::MemoryStore;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        assert_eq!(backoff_delay(60, 0), Duration::seconds(60));
        assert_eq!(backoff_delay(60, 1), Duration::seconds(120));
        assert_eq!(backoff_delay(60, 2), Duration::seconds(240));
        assert_eq!(backoff_delay(60, 3), Duration::seconds(480));
    }

    #[test]
    fn test_backoff_negative_attempt_clamps_to_base() {
        assert_eq!(backoff_delay(60, -1), Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_enqueue_same_message_twice_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let queue = DispatchQueue::new(store.clone(), 3, 60);
        let message_id = Uuid::new_v4();
        let now = Utc::now();

        assert!(queue.enqueue(message_id, now).await.unwrap());
        assert!(!queue.enqueue(message_id, now).await.unwrap());
        assert_eq!(store.job_count().await, 1);
    }

    #[tokio::test]
    async fn test_retry_pushes_eligibility_into_the_future() {
        let store = Arc::new(MemoryStore::new());
        let queue = DispatchQueue::new(store.clone(), 3, 60);
        let now = Utc::now();

        queue.enqueue(Uuid::new_v4(), now).await.unwrap();
        let job = queue.claim_next_due(now).await.unwrap().unwrap();
        queue.retry(&job, "provider 503", now).await.unwrap();

        // Not due again until the backoff has elapsed
        assert!(queue.claim_next_due(now).await.unwrap().is_none());
        let later = now + Duration::seconds(60);
        let rescheduled = queue.claim_next_due(later).await.unwrap().unwrap();
        assert_eq!(rescheduled.attempts, 1);
        assert_eq!(rescheduled.last_error.as_deref(), Some("provider 503"));
    }
}
