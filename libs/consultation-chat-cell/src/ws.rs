// libs/consultation-chat-cell/src/ws.rs
use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::Participant;
use shared_models::error::AppError;
use shared_utils::extractor::resolve_participant;

use crate::error::ChatError;
use crate::models::{ClientEvent, NewChatMessage, RoomState, ServerEvent};
use crate::services::guard::AccessGuard;
use crate::state::ChatState;

#[derive(Debug, Deserialize)]
pub struct WsAuthQuery {
    /// Patient-kind credential.
    pub token: Option<String>,
    /// Clinician-kind credential.
    pub dtoken: Option<String>,
}

/// Upgrades the connection after credential resolution. Room membership is
/// not checked here; that happens per `join`.
pub async fn chat_ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsAuthQuery>,
    State(state): State<ChatState>,
) -> Result<Response, AppError> {
    let participant = resolve_participant(
        params.token.as_deref(),
        params.dtoken.as_deref(),
        &state.config.supabase_jwt_secret,
    )?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, participant)))
}

async fn handle_socket(socket: WebSocket, state: ChatState, participant: Participant) {
    let user_id = match AccessGuard::identity(&participant) {
        Ok(id) => id,
        Err(_) => {
            warn!("Rejecting connection with non-UUID subject");
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    state.presence.register(user_id, connection_id).await;
    info!("User connected: {} ({})", user_id, connection_id);

    let (mut ws_sender, mut receiver) = socket.split();

    // Single writer task; everything destined for this client goes through
    // the mpsc channel.
    let (out_tx, mut out_rx) = mpsc::channel::<ServerEvent>(100);
    let sender_task = tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize server event: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // room id -> forward task for that room's broadcast channel
    let mut joined: HashMap<Uuid, JoinHandle<()>> = HashMap::new();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    if let Err(err) = handle_client_event(
                        event,
                        &state,
                        &participant,
                        user_id,
                        connection_id,
                        &out_tx,
                        &mut joined,
                    )
                    .await
                    {
                        let _ = out_tx
                            .send(ServerEvent::Error {
                                reason: err.reason().to_string(),
                                detail: err.to_string(),
                            })
                            .await;
                    }
                }
                Err(e) => {
                    debug!("Unparseable client event from {}: {}", user_id, e);
                    let _ = out_tx
                        .send(ServerEvent::Error {
                            reason: "validation-error".to_string(),
                            detail: "Invalid event format".to_string(),
                        })
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("WebSocket error for user {}: {}", user_id, e);
                break;
            }
            _ => {} // ping/pong/binary
        }
    }

    // Disconnect: drop every room subscription and the presence entry. No
    // peer-left event is emitted.
    for (room_id, task) in joined.drain() {
        task.abort();
        state.hub.prune(room_id).await;
    }
    sender_task.abort();
    state.presence.unregister(user_id, connection_id).await;
    info!("User disconnected: {} ({})", user_id, connection_id);
}

async fn handle_client_event(
    event: ClientEvent,
    state: &ChatState,
    participant: &Participant,
    user_id: Uuid,
    connection_id: Uuid,
    out_tx: &mpsc::Sender<ServerEvent>,
    joined: &mut HashMap<Uuid, JoinHandle<()>>,
) -> Result<(), ChatError> {
    match event {
        ClientEvent::Join { room_id } => {
            let room = state
                .directory
                .fetch(room_id)
                .await?
                .ok_or(ChatError::RoomNotFound)?;
            AccessGuard::authorize_party(&room, participant)?;

            // Closed rooms may still be joined for a read-only view.
            if !joined.contains_key(&room_id) {
                let rx = state.hub.subscribe(room_id).await;
                let task = spawn_room_forwarder(rx, out_tx.clone(), connection_id);
                joined.insert(room_id, task);
            }

            info!("User {} joined room {}", user_id, room_id);
            let _ = out_tx
                .send(ServerEvent::Joined {
                    room_id,
                    chat_closed: room.state == RoomState::Closed,
                })
                .await;
            Ok(())
        }

        ClientEvent::Send {
            room_id,
            body,
            client_timestamp,
        } => {
            if !joined.contains_key(&room_id) {
                return Err(ChatError::Unauthorized);
            }

            if let Some(ts) = client_timestamp {
                // Advisory only; the store assigns the authoritative time.
                debug!("Client timestamp {} on send to room {}", ts, room_id);
            }

            let trimmed = body.trim();
            if trimmed.is_empty() {
                return Err(ChatError::Validation("Message cannot be empty".to_string()));
            }

            let draft = NewChatMessage {
                room_id,
                sender_id: user_id,
                body: trimmed.to_string(),
                attachment: None,
            };

            state
                .hub
                .publish_message(draft, Some(connection_id))
                .await?;
            Ok(())
        }

        ClientEvent::Typing { room_id } => {
            if joined.contains_key(&room_id) {
                state
                    .hub
                    .publish_typing(room_id, user_id, connection_id, true)
                    .await;
            }
            Ok(())
        }

        ClientEvent::StopTyping { room_id } => {
            if joined.contains_key(&room_id) {
                state
                    .hub
                    .publish_typing(room_id, user_id, connection_id, false)
                    .await;
            }
            Ok(())
        }
    }
}

/// Forwards a room's broadcast stream to this connection, dropping typing
/// signals that originated here.
fn spawn_room_forwarder(
    mut rx: broadcast::Receiver<crate::services::hub::Envelope>,
    out_tx: mpsc::Sender<ServerEvent>,
    connection_id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if envelope.suppressed_for(connection_id) {
                        continue;
                    }
                    if out_tx.send(envelope.event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Connection {} lagged {} events", connection_id, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
