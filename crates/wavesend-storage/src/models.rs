//! Database models for Wavesend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use wavesend_common::types::{CampaignId, ContactId, ContactListId, JobId, MessageId};

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Scheduled => write!(f, "scheduled"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "running" => Ok(CampaignStatus::Running),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            _ => Err(format!("Invalid campaign status: {}", s)),
        }
    }
}

/// Campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub message_template: String,
    pub contact_list_id: Option<ContactListId>,
    pub start_at: DateTime<Utc>,
    pub spread_days: i32,
    pub interval_seconds: i32,
    pub status: String,
    pub total_messages: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Get status enum
    pub fn status_enum(&self) -> Option<CampaignStatus> {
        self.status.parse().ok()
    }

    /// Percentage of messages in a terminal outcome
    pub fn progress_percentage(&self) -> f64 {
        if self.total_messages == 0 {
            return 0.0;
        }
        let done = (self.sent_count + self.failed_count) as f64;
        (done / self.total_messages as f64 * 100.0).min(100.0)
    }
}

/// Input for creating a campaign
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub message_template: String,
    pub contact_list_id: Option<ContactListId>,
    pub start_at: DateTime<Utc>,
    pub spread_days: i32,
    pub interval_seconds: i32,
}

/// Message status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Queued,
    Sending,
    Sent,
    Failed,
    Retry,
    Cancelled,
}

impl MessageStatus {
    /// Statuses that still represent outstanding work for a campaign
    pub const ACTIVE: [MessageStatus; 4] = [
        MessageStatus::Pending,
        MessageStatus::Queued,
        MessageStatus::Sending,
        MessageStatus::Retry,
    ];
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageStatus::Pending => write!(f, "pending"),
            MessageStatus::Queued => write!(f, "queued"),
            MessageStatus::Sending => write!(f, "sending"),
            MessageStatus::Sent => write!(f, "sent"),
            MessageStatus::Failed => write!(f, "failed"),
            MessageStatus::Retry => write!(f, "retry"),
            MessageStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MessageStatus::Pending),
            "queued" => Ok(MessageStatus::Queued),
            "sending" => Ok(MessageStatus::Sending),
            "sent" => Ok(MessageStatus::Sent),
            "failed" => Ok(MessageStatus::Failed),
            "retry" => Ok(MessageStatus::Retry),
            "cancelled" => Ok(MessageStatus::Cancelled),
            _ => Err(format!("Invalid message status: {}", s)),
        }
    }
}

/// Message model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    pub text: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    /// Get status enum
    pub fn status_enum(&self) -> Option<MessageStatus> {
        self.status.parse().ok()
    }
}

/// Input for creating a message at campaign activation
#[derive(Debug, Clone)]
pub struct CreateMessage {
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    pub text: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Dispatch job status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// A durable dispatch job. The job key is the message id: at most one
/// job row exists per message.
#[derive(Debug, Clone, FromRow)]
pub struct DispatchJob {
    pub id: JobId,
    pub message_id: MessageId,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DispatchJob {
    /// Get status enum
    pub fn status_enum(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
    pub is_group: bool,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a contact
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContact {
    pub name: String,
    pub phone: String,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_group: bool,
    pub tags: Option<String>,
}

/// Input for updating a contact
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub is_group: Option<bool>,
    pub tags: Option<String>,
}

/// Contact list model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ContactList {
    pub id: ContactListId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a contact list
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContactList {
    pub name: String,
    pub description: Option<String>,
}

/// Settings row. A single row with id 'default' holds the delivery
/// credential and campaign defaults.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Settings {
    pub id: String,
    pub api_key: Option<String>,
    pub default_interval_seconds: i32,
    pub max_messages_per_day: i32,
    pub updated_at: DateTime<Utc>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            api_key: None,
            default_interval_seconds: 300,
            max_messages_per_day: 500,
            updated_at: Utc::now(),
        }
    }
}

/// Input for updating settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub api_key: Option<String>,
    pub default_interval_seconds: Option<i32>,
    pub max_messages_per_day: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_campaign_status_roundtrip() {
        for status in [
            CampaignStatus::Draft,
            CampaignStatus::Scheduled,
            CampaignStatus::Running,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Cancelled,
        ] {
            let parsed: CampaignStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(!CampaignStatus::Paused.is_terminal());
        assert!(!CampaignStatus::Running.is_terminal());
    }

    #[test]
    fn test_message_status_roundtrip() {
        for status in [
            MessageStatus::Pending,
            MessageStatus::Queued,
            MessageStatus::Sending,
            MessageStatus::Sent,
            MessageStatus::Failed,
            MessageStatus::Retry,
            MessageStatus::Cancelled,
        ] {
            let parsed: MessageStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_progress_percentage() {
        let mut campaign = Campaign {
            id: uuid::Uuid::new_v4(),
            name: "test".to_string(),
            message_template: "hi".to_string(),
            contact_list_id: None,
            start_at: Utc::now(),
            spread_days: 1,
            interval_seconds: 60,
            status: "running".to_string(),
            total_messages: 10,
            sent_count: 3,
            failed_count: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            started_at: None,
            completed_at: None,
        };
        assert_eq!(campaign.progress_percentage(), 50.0);

        campaign.total_messages = 0;
        assert_eq!(campaign.progress_percentage(), 0.0);
    }
}
