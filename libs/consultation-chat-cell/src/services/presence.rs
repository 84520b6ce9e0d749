use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Ephemeral record of which identities are connected through the gateway.
/// Rebuilt per connection lifecycle, never persisted. An identity may hold
/// several live connections at once.
pub struct PresenceRegistry {
    connections: Arc<RwLock<HashMap<Uuid, HashSet<Uuid>>>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, user_id: Uuid, connection_id: Uuid) {
        let mut connections = self.connections.write().await;
        connections.entry(user_id).or_default().insert(connection_id);
        debug!("Registered connection {} for user {}", connection_id, user_id);
    }

    pub async fn unregister(&self, user_id: Uuid, connection_id: Uuid) {
        let mut connections = self.connections.write().await;
        if let Some(handles) = connections.get_mut(&user_id) {
            handles.remove(&connection_id);
            if handles.is_empty() {
                connections.remove(&user_id);
            }
        }
        debug!("Removed connection {} for user {}", connection_id, user_id);
    }

    pub async fn is_online(&self, user_id: Uuid) -> bool {
        let connections = self.connections.read().await;
        connections.contains_key(&user_id)
    }

    pub async fn online_count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PresenceRegistry {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
        }
    }
}
