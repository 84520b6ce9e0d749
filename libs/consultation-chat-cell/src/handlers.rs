// libs/consultation-chat-cell/src/handlers.rs
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_models::auth::Participant;
use shared_models::error::AppError;

use crate::error::ChatError;
use crate::models::{
    Attachment, NewChatMessage, RoomHistoryResponse, RoomState, UploadAttachmentRequest,
};
use crate::services::guard::AccessGuard;
use crate::services::media::decode_file_payload;
use crate::state::ChatState;

/// Full ordered history for a room, readable by either party even after
/// closure.
#[axum::debug_handler]
pub async fn get_room_history(
    State(state): State<ChatState>,
    Path(appointment_id): Path<Uuid>,
    Extension(participant): Extension<Participant>,
) -> Result<Json<RoomHistoryResponse>, AppError> {
    let room = state
        .directory
        .fetch(appointment_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::from(ChatError::RoomNotFound))?;

    AccessGuard::authorize_party(&room, &participant).map_err(AppError::from)?;

    let messages = state.store.list(room.id).await.map_err(AppError::from)?;

    Ok(Json(RoomHistoryResponse {
        messages,
        chat_closed: room.state == RoomState::Closed,
    }))
}

/// Ends the consultation. Clinician-kind credential required; the lifecycle
/// service additionally checks the actor is this room's clinician.
#[axum::debug_handler]
pub async fn end_room(
    State(state): State<ChatState>,
    Path(appointment_id): Path<Uuid>,
    Extension(participant): Extension<Participant>,
) -> Result<Json<Value>, AppError> {
    if !participant.is_clinician() {
        return Err(ChatError::Unauthorized.into());
    }

    state
        .lifecycle()
        .close(appointment_id, &participant)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "message": "Chat closed successfully"
    })))
}

/// Attaches a file to a message over HTTP and re-injects it into the live
/// broadcast. The blob goes to the provider before any append, outside any
/// room lock; the decoded buffer is a scoped local, released on every exit
/// path.
#[axum::debug_handler]
pub async fn upload_attachment(
    State(state): State<ChatState>,
    Path(appointment_id): Path<Uuid>,
    Extension(participant): Extension<Participant>,
    Json(request): Json<UploadAttachmentRequest>,
) -> Result<Json<Value>, AppError> {
    let room = state
        .directory
        .fetch(appointment_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::from(ChatError::RoomNotFound))?;

    let sender_id = AccessGuard::authorize_party(&room, &participant).map_err(AppError::from)?;

    if room.state != RoomState::Open {
        return Err(ChatError::ChatClosed.into());
    }

    if request.file.is_empty() {
        return Err(ChatError::Validation("No file uploaded".to_string()).into());
    }

    let bytes = decode_file_payload(&request.file).map_err(AppError::from)?;

    let media = state
        .media
        .store(room.id, &request.file_name, &request.content_type, bytes)
        .await
        .map_err(AppError::from)?;

    let draft = NewChatMessage {
        room_id: room.id,
        sender_id,
        body: request
            .text
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        attachment: Some(Attachment {
            url: media.url,
            original_name: request.file_name,
            kind: media.kind,
        }),
    };

    // Same funnel as websocket sends: lifecycle gate, append, then
    // broadcast. A failed append leaves no visible reference to the blob.
    let stored = state
        .hub
        .publish_message(draft, None)
        .await
        .map_err(AppError::from)?;

    info!(
        "Attachment message {} uploaded to room {}",
        stored.id, stored.room_id
    );

    Ok(Json(json!({
        "success": true,
        "message": "File uploaded successfully",
        "message_data": stored
    })))
}

/// Permanently deletes a closed consultation. Patient-kind credential
/// required; the lifecycle service checks actor and state.
#[axum::debug_handler]
pub async fn delete_room(
    State(state): State<ChatState>,
    Path(appointment_id): Path<Uuid>,
    Extension(participant): Extension<Participant>,
) -> Result<Json<Value>, AppError> {
    if !participant.is_patient() {
        return Err(ChatError::Unauthorized.into());
    }

    state
        .lifecycle()
        .delete(appointment_id, &participant)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "success": true,
        "message": "Chat deleted successfully"
    })))
}

/// Health probe: configuration status plus live presence count.
#[axum::debug_handler]
pub async fn chat_health_check(State(state): State<ChatState>) -> Json<Value> {
    let configured = state.config.is_configured();
    let online_users = state.presence.online_count().await;
    let active_rooms = state.hub.active_rooms().await.len();

    Json(json!({
        "status": if configured { "healthy" } else { "not_configured" },
        "chat_configured": configured,
        "online_users": online_users,
        "active_rooms": active_rooms
    }))
}
