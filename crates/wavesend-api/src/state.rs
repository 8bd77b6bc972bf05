//! Shared API state

use std::sync::Arc;
use wavesend_core::CampaignManager;
use wavesend_storage::db::DatabasePool;
use wavesend_storage::store::{
    CampaignStore, ContactListStore, ContactStore, MessageStore, SettingsStore,
};
use wavesend_storage::MemoryStore;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub campaigns: Arc<dyn CampaignStore>,
    pub messages: Arc<dyn MessageStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub contact_lists: Arc<dyn ContactListStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub manager: Arc<CampaignManager>,
    /// Present in production; readiness degrades gracefully without it
    pub db_pool: Option<DatabasePool>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        messages: Arc<dyn MessageStore>,
        contacts: Arc<dyn ContactStore>,
        contact_lists: Arc<dyn ContactListStore>,
        settings: Arc<dyn SettingsStore>,
        manager: Arc<CampaignManager>,
        db_pool: Option<DatabasePool>,
    ) -> Self {
        Self {
            campaigns,
            messages,
            contacts,
            contact_lists,
            settings,
            manager,
            db_pool,
        }
    }

    /// State backed entirely by an in-memory store
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        let manager = Arc::new(CampaignManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
        ));
        Self {
            campaigns: store.clone(),
            messages: store.clone(),
            contacts: store.clone(),
            contact_lists: store.clone(),
            settings: store,
            manager,
            db_pool: None,
        }
    }
}
