// libs/consultation-chat-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CONSULTATION CHAT DOMAIN MODELS
// ==============================================================================

/// A chat room bound 1:1 to an appointment. The room exists as soon as the
/// backing appointment does; deletion removes the record entirely, so a
/// deleted room is simply absent from the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsultationRoom {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub state: RoomState,
}

impl ConsultationRoom {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.patient_id == user_id || self.clinician_id == user_id
    }

    pub fn is_open(&self) -> bool {
        self.state == RoomState::Open
    }
}

/// Room lifecycle: `Open -> Closed` (clinician), then the record is removed
/// on delete (patient). No transition back to `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    Open,
    Closed,
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomState::Open => write!(f, "open"),
            RoomState::Closed => write!(f, "closed"),
        }
    }
}

/// A stored chat message. Immutable once appended; `sent_at` and `seq` are
/// store-assigned, and `(sent_at, seq)` is the total order for a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub attachment: Option<Attachment>,
    pub sent_at: DateTime<Utc>,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub original_name: String,
    pub kind: AttachmentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
    Video,
}

impl AttachmentKind {
    /// Anything that is not an image or a video is treated as a document,
    /// matching how the blob provider reports resource kinds.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            AttachmentKind::Image
        } else if content_type.starts_with("video/") {
            AttachmentKind::Video
        } else {
            AttachmentKind::Document
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentKind::Image => write!(f, "image"),
            AttachmentKind::Document => write!(f, "document"),
            AttachmentKind::Video => write!(f, "video"),
        }
    }
}

/// Input to the message store; id, timestamp and sequence are assigned on
/// acceptance.
#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub room_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl NewChatMessage {
    /// A message with an empty body and no attachment is invalid.
    pub fn has_content(&self) -> bool {
        !self.body.trim().is_empty() || self.attachment.is_some()
    }
}

// ==============================================================================
// WEBSOCKET PROTOCOL EVENTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    Join {
        room_id: Uuid,
    },
    Send {
        room_id: Uuid,
        body: String,
        /// Advisory only; ordering comes from the store's server clock.
        client_timestamp: Option<DateTime<Utc>>,
    },
    Typing {
        room_id: Uuid,
    },
    StopTyping {
        room_id: Uuid,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    Joined {
        room_id: Uuid,
        chat_closed: bool,
    },
    MessageReceived {
        message: ChatMessage,
    },
    RoomClosed {
        room_id: Uuid,
    },
    PeerTyping {
        room_id: Uuid,
        user_id: Uuid,
    },
    PeerStoppedTyping {
        room_id: Uuid,
        user_id: Uuid,
    },
    Error {
        reason: String,
        detail: String,
    },
}

// ==============================================================================
// REQUEST / RESPONSE DTOS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadAttachmentRequest {
    /// Optional text accompanying the file.
    pub text: Option<String>,
    /// Base64 file payload; data-URI prefixes are tolerated.
    pub file: String,
    pub file_name: String,
    pub content_type: String,
}

#[derive(Debug, Serialize)]
pub struct RoomHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub chat_closed: bool,
}
