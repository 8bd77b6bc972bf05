//! Wavesend Storage - Persistence layer
//!
//! Postgres-backed repositories behind the store traits the delivery
//! pipeline is written against, plus an in-memory store used for
//! deterministic tests.

pub mod db;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use db::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    CampaignStore, ContactListStore, ContactStore, JobStore, MessageStore, SettingsStore,
    StoreError,
};
