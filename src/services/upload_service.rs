use crate::services::error::{ServiceError, ServiceResult};
use crate::services::storage::StageStore;
use crate::utils::validation::{file_extension, sanitize_object_key, validate_file_size};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

/// An object written into a stage. Identified by `(stage, key)`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StagedObject {
    pub stage: String,
    pub key: String,
    pub size: u64,
    pub content_type: String,
    pub checksum: String,
    pub uploaded_at: DateTime<Utc>,
}

pub struct UploadService {
    store: Arc<dyn StageStore>,
    max_upload_size: usize,
}

impl UploadService {
    pub fn new(store: Arc<dyn StageStore>, max_upload_size: usize) -> Self {
        Self {
            store,
            max_upload_size,
        }
    }

    /// Writes `data` under the uploaded file name, replacing whatever was
    /// stored under that name before. The stage must already exist.
    pub async fn upload(
        &self,
        stage: &str,
        filename: &str,
        data: Vec<u8>,
    ) -> ServiceResult<StagedObject> {
        let key = sanitize_object_key(filename)?;
        validate_file_size(data.len(), self.max_upload_size)?;

        let content_type = content_type_for(&key, &data);
        let checksum = hex::encode(Sha256::digest(&data));
        let size = data.len() as u64;

        if let Err(e) = self
            .store
            .put_object(stage, &key, data, Some(&content_type))
            .await
        {
            error!("❌ Upload of '{}' to @{} failed: {:?}", key, stage, e);
            return Err(ServiceError::UploadFailed {
                key,
                reason: e.to_string(),
            });
        }

        info!("📦 File '{}' uploaded to @{} ({} bytes)", key, stage, size);

        Ok(StagedObject {
            stage: stage.to_string(),
            key,
            size,
            content_type,
            checksum,
            uploaded_at: Utc::now(),
        })
    }
}

/// Content type from the extension, then from magic bytes.
pub fn content_type_for(key: &str, data: &[u8]) -> String {
    let by_extension = file_extension(key).and_then(|ext| {
        let content_type = match ext.as_str() {
            ".jpg" | ".jpeg" => mime::IMAGE_JPEG.to_string(),
            ".png" => mime::IMAGE_PNG.to_string(),
            ".gif" => mime::IMAGE_GIF.to_string(),
            ".webp" => "image/webp".to_string(),
            ".pdf" => mime::APPLICATION_PDF.to_string(),
            ".csv" => mime::TEXT_CSV.to_string(),
            ".tsv" => mime::TEXT_TAB_SEPARATED_VALUES.to_string(),
            ".txt" => mime::TEXT_PLAIN.to_string(),
            ".wav" => "audio/wav".to_string(),
            ".mp3" => "audio/mpeg".to_string(),
            ".ogg" => "audio/ogg".to_string(),
            ".flac" => "audio/flac".to_string(),
            ".m4a" => "audio/mp4".to_string(),
            _ => return None,
        };
        Some(content_type)
    });

    by_extension
        .or_else(|| infer::get(data).map(|kind| kind.mime_type().to_string()))
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string())
}
