//! Wavesend Core - campaign delivery pipeline
//!
//! This crate provides the delivery pipeline for Wavesend: schedule
//! computation, campaign lifecycle management, the due-message poller,
//! the durable dispatch queue, the serial delivery worker, and the
//! completion checker.

pub mod checker;
pub mod delivery;
pub mod manager;
pub mod poller;
pub mod queue;
pub mod schedule;
pub mod template;
pub mod worker;

pub use checker::CompletionChecker;
pub use delivery::{DeliveryApi, DeliveryError, HttpDeliveryClient, RateLimitInfo, SendReceipt};
pub use manager::{CampaignError, CampaignManager, QuickSendRequest};
pub use poller::Poller;
pub use queue::DispatchQueue;
pub use schedule::{compute_schedule, ScheduleEntry};
pub use template::resolve_template;
pub use worker::DeliveryWorker;
