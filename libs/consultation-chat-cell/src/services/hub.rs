use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::models::{ChatMessage, NewChatMessage, RoomState, ServerEvent};
use crate::services::rooms::RoomDirectory;
use crate::services::store::ChatStore;

/// What travels over a room's broadcast channel. `origin` identifies the
/// connection a typing signal came from so it is never echoed back;
/// out-of-band events carry no origin.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: Option<Uuid>,
    pub event: ServerEvent,
}

impl Envelope {
    /// Typing presence is the only event class suppressed at its origin.
    pub fn suppressed_for(&self, connection_id: Uuid) -> bool {
        matches!(
            self.event,
            ServerEvent::PeerTyping { .. } | ServerEvent::PeerStoppedTyping { .. }
        ) && self.origin == Some(connection_id)
    }
}

struct RoomChannel {
    sender: broadcast::Sender<Envelope>,
    /// Serializes append-then-broadcast so broadcast order always agrees
    /// with store acceptance order. Held per room; rooms never contend.
    write_lock: Arc<Mutex<()>>,
}

/// Per-room publish/subscribe hub. Every write path funnels through
/// `publish_message`, so no transport can bypass the lifecycle gate.
pub struct ChatHub {
    rooms: Arc<RwLock<HashMap<Uuid, RoomChannel>>>,
    directory: Arc<dyn RoomDirectory>,
    store: Arc<dyn ChatStore>,
}

impl ChatHub {
    pub fn new(directory: Arc<dyn RoomDirectory>, store: Arc<dyn ChatStore>) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            directory,
            store,
        }
    }

    /// Subscribes a connection to a room's broadcast group, creating the
    /// channel lazily.
    pub async fn subscribe(&self, room_id: Uuid) -> broadcast::Receiver<Envelope> {
        let mut rooms = self.rooms.write().await;
        let channel = rooms.entry(room_id).or_insert_with(|| {
            debug!("Created broadcast channel for room {}", room_id);
            let (sender, _) = broadcast::channel(100);
            RoomChannel {
                sender,
                write_lock: Arc::new(Mutex::new(())),
            }
        });
        channel.sender.subscribe()
    }

    /// Drops a room's channel once nothing is listening. Called after a
    /// connection unsubscribes.
    pub async fn prune(&self, room_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        if let Some(channel) = rooms.get(&room_id) {
            if channel.sender.receiver_count() == 0 {
                rooms.remove(&room_id);
                debug!("Removed idle broadcast channel for room {}", room_id);
            }
        }
    }

    /// Removes a room's channel unconditionally (room deleted).
    pub async fn drop_room(&self, room_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        rooms.remove(&room_id);
    }

    pub async fn active_rooms(&self) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms.keys().cloned().collect()
    }

    /// The single write funnel: checks the room still exists and is open,
    /// appends to the store, then broadcasts the stored message — all under
    /// the room's write lock so acceptance order and broadcast order agree.
    pub async fn publish_message(
        &self,
        draft: NewChatMessage,
        origin: Option<Uuid>,
    ) -> Result<ChatMessage, ChatError> {
        let room_id = draft.room_id;
        let (sender, write_lock) = self.channel_handles(room_id).await;

        let _guard = write_lock.lock().await;

        let room = self
            .directory
            .fetch(room_id)
            .await?
            .ok_or(ChatError::RoomNotFound)?;
        if room.state != RoomState::Open {
            return Err(ChatError::ChatClosed);
        }

        let stored = self.store.append(draft).await?;

        let envelope = Envelope {
            origin,
            event: ServerEvent::MessageReceived {
                message: stored.clone(),
            },
        };
        if let Err(e) = sender.send(envelope) {
            // No live subscribers; the message is already durable.
            debug!("No subscribers for room {}: {}", room_id, e);
        }

        debug!("Published message {} to room {}", stored.id, room_id);
        Ok(stored)
    }

    /// Broadcasts a typing signal. Never persisted; suppressed at its
    /// origin by the subscriber loop.
    pub async fn publish_typing(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        connection_id: Uuid,
        started: bool,
    ) {
        let event = if started {
            ServerEvent::PeerTyping { room_id, user_id }
        } else {
            ServerEvent::PeerStoppedTyping { room_id, user_id }
        };

        self.broadcast(
            room_id,
            Envelope {
                origin: Some(connection_id),
                event,
            },
        )
        .await;
    }

    /// Out-of-band closure fan-out: reaches current subscribers even when
    /// the closing actor holds no gateway connection.
    pub async fn notify_closed(&self, room_id: Uuid) {
        self.broadcast(
            room_id,
            Envelope {
                origin: None,
                event: ServerEvent::RoomClosed { room_id },
            },
        )
        .await;
    }

    async fn broadcast(&self, room_id: Uuid, envelope: Envelope) {
        let rooms = self.rooms.read().await;
        if let Some(channel) = rooms.get(&room_id) {
            if let Err(e) = channel.sender.send(envelope) {
                warn!("Failed to broadcast to room {}: {}", room_id, e);
            }
        }
    }

    async fn channel_handles(&self, room_id: Uuid) -> (broadcast::Sender<Envelope>, Arc<Mutex<()>>) {
        let mut rooms = self.rooms.write().await;
        let channel = rooms.entry(room_id).or_insert_with(|| {
            let (sender, _) = broadcast::channel(100);
            RoomChannel {
                sender,
                write_lock: Arc::new(Mutex::new(())),
            }
        });
        (channel.sender.clone(), Arc::clone(&channel.write_lock))
    }
}

impl Clone for ChatHub {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
            directory: Arc::clone(&self.directory),
            store: Arc::clone(&self.store),
        }
    }
}
