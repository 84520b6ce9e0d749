use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::ChatError;
use crate::models::AttachmentKind;

/// Durable reference returned by the blob provider.
#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub kind: AttachmentKind,
}

/// Opaque blob-storage provider: takes bytes, returns a durable URL and a
/// resource kind. Must be called before any append and outside any room
/// lock.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn store(
        &self,
        room_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredMedia, ChatError>;
}

/// Decodes a base64 file payload, tolerating data-URI prefixes.
pub fn decode_file_payload(payload: &str) -> Result<Vec<u8>, ChatError> {
    let base64_data = if payload.contains(";base64,") {
        payload.split(";base64,").nth(1).unwrap_or(payload)
    } else {
        payload
    };

    BASE64
        .decode(base64_data)
        .map_err(|e| ChatError::Validation(format!("Failed to decode file data: {}", e)))
}

pub struct SupabaseMediaStorage {
    supabase: SupabaseClient,
    bucket: String,
}

impl SupabaseMediaStorage {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.chat_storage_bucket.clone(),
        }
    }
}

#[async_trait]
impl MediaStorage for SupabaseMediaStorage {
    async fn store(
        &self,
        room_id: Uuid,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredMedia, ChatError> {
        let file_ext = if content_type.contains('/') {
            content_type.split('/').next_back().unwrap_or("bin")
        } else {
            content_type
        };

        let object_path = format!("{}/{}.{}", room_id, Uuid::new_v4(), file_ext);
        debug!(
            "Uploading attachment {} for room {} to {}",
            file_name, room_id, object_path
        );

        let storage_path = self
            .supabase
            .upload_object(&self.bucket, &object_path, bytes, content_type)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?;

        Ok(StoredMedia {
            url: self.supabase.get_public_url(&storage_path),
            kind: AttachmentKind::from_content_type(content_type),
        })
    }
}
