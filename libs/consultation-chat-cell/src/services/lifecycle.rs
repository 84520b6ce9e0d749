use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_models::auth::Participant;

use crate::error::ChatError;
use crate::models::RoomState;
use crate::services::guard::AccessGuard;
use crate::services::hub::ChatHub;
use crate::services::rooms::RoomDirectory;
use crate::services::store::ChatStore;

/// Owns the room state machine:
/// `Open --close(clinician)--> Closed --delete(patient)--> Deleted`.
/// Both transitions are irreversible.
pub struct LifecycleService {
    directory: Arc<dyn RoomDirectory>,
    store: Arc<dyn ChatStore>,
    hub: ChatHub,
}

impl LifecycleService {
    pub fn new(directory: Arc<dyn RoomDirectory>, store: Arc<dyn ChatStore>, hub: ChatHub) -> Self {
        Self {
            directory,
            store,
            hub,
        }
    }

    /// Ends the consultation. Only the room's clinician may close; closing
    /// an already-closed room is a no-op. Live subscribers are notified
    /// through the hub even when the clinician is not connected to it.
    pub async fn close(&self, room_id: Uuid, actor: &Participant) -> Result<(), ChatError> {
        let room = self
            .directory
            .fetch(room_id)
            .await?
            .ok_or(ChatError::RoomNotFound)?;

        AccessGuard::authorize_clinician(&room, actor)?;

        if room.state == RoomState::Closed {
            return Ok(());
        }

        self.directory.set_closed(room_id).await?;
        self.hub.notify_closed(room_id).await;

        info!("Room {} closed by clinician {}", room_id, actor.id());
        Ok(())
    }

    /// Permanently removes a closed consultation: every message first, then
    /// the room record itself.
    pub async fn delete(&self, room_id: Uuid, actor: &Participant) -> Result<(), ChatError> {
        let room = self
            .directory
            .fetch(room_id)
            .await?
            .ok_or(ChatError::RoomNotFound)?;

        AccessGuard::authorize_patient(&room, actor)?;

        if room.state != RoomState::Closed {
            return Err(ChatError::InvalidState(
                "Only closed consultations can be deleted".to_string(),
            ));
        }

        self.store.delete_all(room_id).await?;
        self.directory.delete(room_id).await?;
        self.hub.drop_room(room_id).await;

        info!("Room {} deleted by patient {}", room_id, actor.id());
        Ok(())
    }
}
