mod common;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::text_message;
use consultation_chat_cell::error::ChatError;
use consultation_chat_cell::models::RoomState;
use consultation_chat_cell::services::media::{MediaStorage, SupabaseMediaStorage};
use consultation_chat_cell::services::rooms::{RoomDirectory, SupabaseRoomDirectory};
use consultation_chat_cell::services::store::{ChatStore, SupabaseChatStore};
use shared_config::AppConfig;
use shared_utils::test_utils::MockSupabaseResponses;

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "test-secret".to_string(),
        chat_storage_bucket: "chat-files".to_string(),
    }
}

#[tokio::test]
async fn directory_fetch_maps_appointment_rows_to_rooms() {
    let server = MockServer::start().await;
    let room_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let clinician_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::appointment_row(
                &room_id.to_string(),
                &patient_id.to_string(),
                &clinician_id.to_string(),
                false,
            ),
        ))
        .mount(&server)
        .await;

    let directory = SupabaseRoomDirectory::new(&config_for(&server));
    let room = directory.fetch(room_id).await.unwrap().unwrap();

    assert_eq!(room.id, room_id);
    assert_eq!(room.patient_id, patient_id);
    assert_eq!(room.clinician_id, clinician_id);
    assert_eq!(room.state, RoomState::Open);
}

#[tokio::test]
async fn directory_fetch_maps_missing_rows_to_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = SupabaseRoomDirectory::new(&config_for(&server));
    assert!(directory.fetch(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn directory_set_closed_on_missing_room_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = SupabaseRoomDirectory::new(&config_for(&server));
    assert_matches!(
        directory.set_closed(Uuid::new_v4()).await,
        Err(ChatError::RoomNotFound)
    );
}

#[tokio::test]
async fn store_append_returns_the_inserted_representation() {
    let server = MockServer::start().await;
    let room_id = Uuid::new_v4();
    let sender_id = Uuid::new_v4();
    let message_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/chat_messages"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::message_row(
                &message_id.to_string(),
                &room_id.to_string(),
                &sender_id.to_string(),
                "hello",
                1,
            )
        ])))
        .mount(&server)
        .await;

    let store = SupabaseChatStore::new(&config_for(&server));
    let stored = store
        .append(text_message(room_id, sender_id, "hello"))
        .await
        .unwrap();

    assert_eq!(stored.id, message_id);
    assert_eq!(stored.body, "hello");
    assert_eq!(stored.seq, 1);
    assert!(stored.attachment.is_none());
}

#[tokio::test]
async fn store_append_rejects_empty_drafts_before_any_request() {
    // No insert mock mounted: any request would 404 and fail the test.
    let server = MockServer::start().await;
    let store = SupabaseChatStore::new(&config_for(&server));

    let result = store
        .append(text_message(Uuid::new_v4(), Uuid::new_v4(), "  "))
        .await;

    assert_matches!(result, Err(ChatError::Validation(_)));
}

#[tokio::test]
async fn store_surfaces_backend_failures_as_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/chat_messages"))
        .respond_with(ResponseTemplate::new(500).set_body_string("db down"))
        .mount(&server)
        .await;

    let store = SupabaseChatStore::new(&config_for(&server));
    let result = store
        .append(text_message(Uuid::new_v4(), Uuid::new_v4(), "hello"))
        .await;

    let err = result.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn media_storage_returns_public_url_and_kind() {
    let server = MockServer::start().await;
    let room_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let media = SupabaseMediaStorage::new(&config_for(&server));
    let stored = media
        .store(room_id, "scan.png", "image/png", b"bytes".to_vec())
        .await
        .unwrap();

    assert!(stored
        .url
        .starts_with(&format!("{}/storage/v1/object/public/chat-files/", server.uri())));
    assert_eq!(
        stored.kind,
        consultation_chat_cell::models::AttachmentKind::Image
    );
}

#[tokio::test]
async fn media_storage_failure_is_a_storage_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let media = SupabaseMediaStorage::new(&config_for(&server));
    let result = media
        .store(Uuid::new_v4(), "scan.png", "image/png", b"bytes".to_vec())
        .await;

    assert_matches!(result, Err(ChatError::Storage(_)));
}
