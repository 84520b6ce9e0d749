use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::ChatError;
use crate::models::{Attachment, AttachmentKind, ChatMessage, NewChatMessage};

/// Durable, append-only log of messages keyed by room. The store is the
/// ordering authority: two messages accepted for the same room are totally
/// ordered by `(sent_at, seq)`.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Assigns id, server timestamp and sequence. Rejects a message whose
    /// body trims empty when no attachment is present.
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, ChatError>;

    /// Full history for a room, ascending by `(sent_at, seq)`.
    async fn list(&self, room_id: Uuid) -> Result<Vec<ChatMessage>, ChatError>;

    /// Removes every message for a room. Invoked only by the lifecycle
    /// delete transition.
    async fn delete_all(&self, room_id: Uuid) -> Result<(), ChatError>;
}

fn require_content(message: &NewChatMessage) -> Result<(), ChatError> {
    if !message.has_content() {
        return Err(ChatError::Validation(
            "Message cannot be empty".to_string(),
        ));
    }
    Ok(())
}

// ==============================================================================
// SUPABASE-BACKED STORE
// ==============================================================================

#[derive(Debug, Deserialize)]
struct ChatMessageRow {
    id: Uuid,
    room_id: Uuid,
    sender_id: Uuid,
    body: String,
    attachment_url: Option<String>,
    attachment_name: Option<String>,
    attachment_kind: Option<AttachmentKind>,
    sent_at: DateTime<Utc>,
    seq: u64,
}

impl ChatMessageRow {
    fn into_message(self) -> ChatMessage {
        let attachment = match (self.attachment_url, self.attachment_name, self.attachment_kind) {
            (Some(url), Some(original_name), Some(kind)) => Some(Attachment {
                url,
                original_name,
                kind,
            }),
            _ => None,
        };

        ChatMessage {
            id: self.id,
            room_id: self.room_id,
            sender_id: self.sender_id,
            body: self.body,
            attachment,
            sent_at: self.sent_at,
            seq: self.seq,
        }
    }
}

pub struct SupabaseChatStore {
    supabase: SupabaseClient,
}

impl SupabaseChatStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl ChatStore for SupabaseChatStore {
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, ChatError> {
        require_content(&message)?;

        let mut row = json!({
            "room_id": message.room_id,
            "sender_id": message.sender_id,
            "body": message.body,
        });

        if let Some(attachment) = &message.attachment {
            row["attachment_url"] = json!(attachment.url);
            row["attachment_name"] = json!(attachment.original_name);
            row["attachment_kind"] = json!(attachment.kind);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let inserted: Vec<ChatMessageRow> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/chat_messages",
                None,
                Some(row),
                Some(headers),
            )
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        let row = inserted
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Store("Append returned no row".to_string()))?;

        debug!("Appended message {} to room {}", row.id, row.room_id);
        Ok(row.into_message())
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        let path = format!(
            "/rest/v1/chat_messages?room_id=eq.{}&order=sent_at.asc,seq.asc",
            room_id
        );

        let rows: Vec<ChatMessageRow> = self
            .supabase
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        Ok(rows.into_iter().map(ChatMessageRow::into_message).collect())
    }

    async fn delete_all(&self, room_id: Uuid) -> Result<(), ChatError> {
        let path = format!("/rest/v1/chat_messages?room_id=eq.{}", room_id);

        let _: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::DELETE,
                &path,
                None,
                None,
                Some({
                    let mut headers = reqwest::header::HeaderMap::new();
                    headers.insert(
                        "Prefer",
                        reqwest::header::HeaderValue::from_static("return=representation"),
                    );
                    headers
                }),
            )
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        debug!("Deleted all messages for room {}", room_id);
        Ok(())
    }
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

/// Process-local store. Acceptance order is fixed inside the write lock, so
/// the log itself serializes concurrent appends to the same room.
pub struct InMemoryChatStore {
    messages: Arc<RwLock<HashMap<Uuid, Vec<ChatMessage>>>>,
    next_seq: Arc<RwLock<u64>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(HashMap::new())),
            next_seq: Arc::new(RwLock::new(0)),
        }
    }
}

impl Default for InMemoryChatStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, ChatError> {
        require_content(&message)?;

        let mut messages = self.messages.write().await;
        let mut next_seq = self.next_seq.write().await;
        *next_seq += 1;

        let log = messages.entry(message.room_id).or_default();

        // Timestamps never run backwards within a room, even if the clock does.
        let mut sent_at = Utc::now();
        if let Some(last) = log.last() {
            if last.sent_at > sent_at {
                sent_at = last.sent_at;
            }
        }

        let stored = ChatMessage {
            id: Uuid::new_v4(),
            room_id: message.room_id,
            sender_id: message.sender_id,
            body: message.body,
            attachment: message.attachment,
            sent_at,
            seq: *next_seq,
        };

        log.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        let messages = self.messages.read().await;
        Ok(messages.get(&room_id).cloned().unwrap_or_default())
    }

    async fn delete_all(&self, room_id: Uuid) -> Result<(), ChatError> {
        let mut messages = self.messages.write().await;
        messages.remove(&room_id);
        Ok(())
    }
}

impl Clone for InMemoryChatStore {
    fn clone(&self) -> Self {
        Self {
            messages: Arc::clone(&self.messages),
            next_seq: Arc::clone(&self.next_seq),
        }
    }
}
