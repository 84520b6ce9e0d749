#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use consultation_chat_cell::error::ChatError;
use consultation_chat_cell::models::{AttachmentKind, ConsultationRoom, NewChatMessage, RoomState};
use consultation_chat_cell::services::media::{MediaStorage, StoredMedia};
use consultation_chat_cell::services::rooms::{InMemoryRoomDirectory, RoomDirectory};
use consultation_chat_cell::services::store::{ChatStore, InMemoryChatStore};
use consultation_chat_cell::state::ChatState;
use shared_models::auth::{CredentialKind, Participant, User};
use shared_utils::test_utils::TestConfig;

/// Blob provider stand-in: returns a durable-looking URL without a network.
pub struct FakeMediaStorage;

#[async_trait]
impl MediaStorage for FakeMediaStorage {
    async fn store(
        &self,
        room_id: Uuid,
        file_name: &str,
        content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredMedia, ChatError> {
        Ok(StoredMedia {
            url: format!("https://files.test/{}/{}", room_id, file_name),
            kind: AttachmentKind::from_content_type(content_type),
        })
    }
}

/// Blob provider that always fails, for exercising upload error paths.
pub struct FailingMediaStorage;

#[async_trait]
impl MediaStorage for FailingMediaStorage {
    async fn store(
        &self,
        _room_id: Uuid,
        _file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredMedia, ChatError> {
        Err(ChatError::Storage("blob provider unavailable".to_string()))
    }
}

pub struct TestBackends {
    pub directory: Arc<InMemoryRoomDirectory>,
    pub store: Arc<InMemoryChatStore>,
    pub state: ChatState,
}

pub fn make_state() -> TestBackends {
    make_state_with_media(Arc::new(FakeMediaStorage))
}

pub fn make_state_with_media(media: Arc<dyn MediaStorage>) -> TestBackends {
    let config = TestConfig::default().to_arc();
    let directory = Arc::new(InMemoryRoomDirectory::new());
    let store = Arc::new(InMemoryChatStore::new());
    let state = ChatState::new(
        config,
        Arc::clone(&directory) as Arc<dyn RoomDirectory>,
        Arc::clone(&store) as Arc<dyn ChatStore>,
        media,
    );
    TestBackends {
        directory,
        store,
        state,
    }
}

pub fn open_room() -> ConsultationRoom {
    ConsultationRoom {
        id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        clinician_id: Uuid::new_v4(),
        state: RoomState::Open,
    }
}

pub fn participant(id: Uuid, kind: CredentialKind) -> Participant {
    Participant {
        user: User {
            id: id.to_string(),
            email: None,
            role: None,
            created_at: None,
        },
        kind,
    }
}

pub fn text_message(room_id: Uuid, sender_id: Uuid, body: &str) -> NewChatMessage {
    NewChatMessage {
        room_id,
        sender_id,
        body: body.to_string(),
        attachment: None,
    }
}
