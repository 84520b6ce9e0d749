use std::sync::Arc;

use shared_config::AppConfig;

use crate::services::hub::ChatHub;
use crate::services::lifecycle::LifecycleService;
use crate::services::media::{MediaStorage, SupabaseMediaStorage};
use crate::services::presence::PresenceRegistry;
use crate::services::rooms::{RoomDirectory, SupabaseRoomDirectory};
use crate::services::store::{ChatStore, SupabaseChatStore};

/// Shared state for the chat cell. The hub and presence registry are
/// process-wide singletons; everything else is a handle to a backend.
#[derive(Clone)]
pub struct ChatState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn RoomDirectory>,
    pub store: Arc<dyn ChatStore>,
    pub media: Arc<dyn MediaStorage>,
    pub hub: ChatHub,
    pub presence: PresenceRegistry,
}

impl ChatState {
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn RoomDirectory>,
        store: Arc<dyn ChatStore>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        let hub = ChatHub::new(Arc::clone(&directory), Arc::clone(&store));
        Self {
            config,
            directory,
            store,
            media,
            hub,
            presence: PresenceRegistry::new(),
        }
    }

    /// Production wiring: Supabase-backed directory, store and media.
    pub fn from_env(config: Arc<AppConfig>) -> Self {
        let directory = Arc::new(SupabaseRoomDirectory::new(&config));
        let store = Arc::new(SupabaseChatStore::new(&config));
        let media = Arc::new(SupabaseMediaStorage::new(&config));
        Self::new(config, directory, store, media)
    }

    pub fn lifecycle(&self) -> LifecycleService {
        LifecycleService::new(
            Arc::clone(&self.directory),
            Arc::clone(&self.store),
            self.hub.clone(),
        )
    }
}
