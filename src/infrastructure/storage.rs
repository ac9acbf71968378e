use crate::config::{AppConfig, StorageBackend};
use crate::services::storage::{MemoryStageStore, S3StageStore, StageStore};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_storage(config: &AppConfig) -> Arc<dyn StageStore> {
    if config.storage_backend == StorageBackend::Memory {
        warn!("🧪 Using in-memory stages; uploads are lost on restart");
        return Arc::new(MemoryStageStore::new());
    }

    let mut loader = aws_config::from_env().region(Region::new(config.s3_region.clone()));

    if let Some(endpoint_url) = &config.s3_endpoint {
        info!("☁️  S3 Storage: {}", endpoint_url);
        loader = loader.endpoint_url(endpoint_url);
    } else {
        info!("☁️  S3 Storage: AWS ({})", config.s3_region);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.s3_access_key, &config.s3_secret_key) {
        loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
            access_key.clone(),
            secret_key.clone(),
            None,
            None,
            "static",
        ));
    }

    let aws_config = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(config.s3_endpoint.is_some())
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

    // Stages are provisioned lazily on first use, not here.
    Arc::new(S3StageStore::new(
        s3_client,
        config.s3_bucket_prefix.clone(),
        config.s3_region.clone(),
    ))
}
