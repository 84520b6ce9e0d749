use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::ChatError;
use crate::models::{ConsultationRoom, RoomState};

/// Directory of consultation rooms, one per appointment. `fetch` returning
/// `None` means the room was never created or has been deleted.
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn fetch(&self, room_id: Uuid) -> Result<Option<ConsultationRoom>, ChatError>;

    async fn set_closed(&self, room_id: Uuid) -> Result<(), ChatError>;

    /// Removes the room record. Message cleanup is the caller's job.
    async fn delete(&self, room_id: Uuid) -> Result<(), ChatError>;
}

// ==============================================================================
// SUPABASE-BACKED DIRECTORY
// ==============================================================================

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    id: Uuid,
    patient_id: Uuid,
    doctor_id: Uuid,
    chat_closed: Option<bool>,
}

impl AppointmentRow {
    fn into_room(self) -> ConsultationRoom {
        ConsultationRoom {
            id: self.id,
            patient_id: self.patient_id,
            clinician_id: self.doctor_id,
            state: if self.chat_closed.unwrap_or(false) {
                RoomState::Closed
            } else {
                RoomState::Open
            },
        }
    }
}

pub struct SupabaseRoomDirectory {
    supabase: SupabaseClient,
}

impl SupabaseRoomDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn representation_headers() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        headers
    }
}

#[async_trait]
impl RoomDirectory for SupabaseRoomDirectory {
    async fn fetch(&self, room_id: Uuid) -> Result<Option<ConsultationRoom>, ChatError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select=id,patient_id,doctor_id,chat_closed",
            room_id
        );

        let rows: Vec<AppointmentRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        Ok(rows.into_iter().next().map(AppointmentRow::into_room))
    }

    async fn set_closed(&self, room_id: Uuid) -> Result<(), ChatError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", room_id);

        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                None,
                Some(json!({ "chat_closed": true })),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        if updated.is_empty() {
            return Err(ChatError::RoomNotFound);
        }

        debug!("Marked room {} closed", room_id);
        Ok(())
    }

    async fn delete(&self, room_id: Uuid) -> Result<(), ChatError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", room_id);

        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        if deleted.is_empty() {
            return Err(ChatError::RoomNotFound);
        }

        debug!("Deleted room {}", room_id);
        Ok(())
    }
}

// ==============================================================================
// IN-MEMORY DIRECTORY
// ==============================================================================

/// Process-local directory used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRoomDirectory {
    rooms: Arc<RwLock<HashMap<Uuid, ConsultationRoom>>>,
}

impl InMemoryRoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, room: ConsultationRoom) {
        let mut rooms = self.rooms.write().await;
        rooms.insert(room.id, room);
    }
}

#[async_trait]
impl RoomDirectory for InMemoryRoomDirectory {
    async fn fetch(&self, room_id: Uuid) -> Result<Option<ConsultationRoom>, ChatError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&room_id).cloned())
    }

    async fn set_closed(&self, room_id: Uuid) -> Result<(), ChatError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(&room_id).ok_or(ChatError::RoomNotFound)?;
        room.state = RoomState::Closed;
        Ok(())
    }

    async fn delete(&self, room_id: Uuid) -> Result<(), ChatError> {
        let mut rooms = self.rooms.write().await;
        rooms.remove(&room_id).ok_or(ChatError::RoomNotFound)?;
        Ok(())
    }
}

impl Clone for InMemoryRoomDirectory {
    fn clone(&self) -> Self {
        Self {
            rooms: Arc::clone(&self.rooms),
        }
    }
}
