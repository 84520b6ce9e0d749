use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Chat closed permanently")]
    ChatClosed,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Message store error: {0}")]
    Store(String),

    #[error("Media storage error: {0}")]
    Storage(String),
}

impl ChatError {
    /// Stable reason string carried by websocket `error` events.
    pub fn reason(&self) -> &'static str {
        match self {
            ChatError::Authentication(_) => "authentication-error",
            ChatError::Unauthorized => "unauthorized",
            ChatError::RoomNotFound => "not-found",
            ChatError::ChatClosed => "chat-closed",
            ChatError::Validation(_) => "validation-error",
            ChatError::InvalidState(_) => "invalid-state",
            ChatError::Store(_) => "store-error",
            ChatError::Storage(_) => "storage-error",
        }
    }

    /// Store failures are worth retrying; everything else is terminal for
    /// the call that produced it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Store(_))
    }
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Authentication(msg) => AppError::Auth(msg),
            ChatError::Unauthorized => AppError::Auth("Unauthorized access".to_string()),
            ChatError::RoomNotFound => AppError::NotFound("Room not found".to_string()),
            ChatError::ChatClosed => AppError::BadRequest("Chat closed permanently".to_string()),
            ChatError::Validation(msg) => AppError::ValidationError(msg),
            ChatError::InvalidState(msg) => AppError::BadRequest(msg),
            ChatError::Store(msg) => AppError::Database(msg),
            ChatError::Storage(msg) => AppError::ExternalService(msg),
        }
    }
}
