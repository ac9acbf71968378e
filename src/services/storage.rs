use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ServerSideEncryption,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration, ServerSideEncryptionRule,
};
use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;
use utoipa::ToSchema;

/// Encryption policy applied when a stage is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageEncryption {
    /// Server-side encryption with store-managed keys
    ServerSide,
}

/// Bytes of a staged object plus the content type recorded at upload
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait StageStore: Send + Sync {
    /// Fails when the stage cannot be described. A stage that exists but
    /// carries no recognised default encryption describes as `None`.
    async fn describe_stage(&self, stage: &str) -> Result<Option<StageEncryption>>;
    /// Creates the stage if missing and applies `encryption` to it. Succeeds
    /// on a stage that already exists.
    async fn create_stage(&self, stage: &str, encryption: StageEncryption) -> Result<()>;
    /// Writes `data` under `key`, replacing any existing object
    async fn put_object(
        &self,
        stage: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()>;
    /// Returns `None` when the key, or the whole stage, does not exist
    async fn get_object(&self, stage: &str, key: &str) -> Result<Option<ObjectData>>;
}

const ENCRYPTION_NOT_FOUND: &str = "ServerSideEncryptionConfigurationNotFoundError";
const NO_SUCH_BUCKET: &str = "NoSuchBucket";

pub struct S3StageStore {
    client: Client,
    bucket_prefix: String,
    region: String,
}

impl S3StageStore {
    pub fn new(client: Client, bucket_prefix: String, region: String) -> Self {
        Self {
            client,
            bucket_prefix,
            region,
        }
    }

    /// Bucket names reject underscores and upper case, stage names may carry both.
    pub fn bucket_name(&self, stage: &str) -> String {
        format!("{}{}", self.bucket_prefix, stage)
            .replace('_', "-")
            .to_lowercase()
    }

    /// us-east-1 is the implicit location and rejects an explicit constraint.
    pub fn location_constraint(&self) -> Option<CreateBucketConfiguration> {
        if self.region.is_empty() || self.region == "us-east-1" {
            return None;
        }
        Some(
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                .build(),
        )
    }
}

/// The stage policy a bucket's encryption rules satisfy, if any.
pub fn encryption_from_rules(rules: &[ServerSideEncryptionRule]) -> Option<StageEncryption> {
    rules
        .iter()
        .filter_map(|rule| rule.apply_server_side_encryption_by_default())
        .any(|by_default| *by_default.sse_algorithm() == ServerSideEncryption::Aes256)
        .then_some(StageEncryption::ServerSide)
}

#[async_trait]
impl StageStore for S3StageStore {
    async fn describe_stage(&self, stage: &str) -> Result<Option<StageEncryption>> {
        let bucket = self.bucket_name(stage);

        self.client.head_bucket().bucket(&bucket).send().await?;

        match self.client.get_bucket_encryption().bucket(&bucket).send().await {
            Ok(output) => Ok(output
                .server_side_encryption_configuration()
                .and_then(|config| encryption_from_rules(config.rules()))),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.code() == Some(ENCRYPTION_NOT_FOUND) {
                    Ok(None)
                } else {
                    Err(anyhow!(service_error))
                }
            }
        }
    }

    async fn create_stage(&self, stage: &str, encryption: StageEncryption) -> Result<()> {
        let bucket = self.bucket_name(stage);

        let created = self
            .client
            .create_bucket()
            .bucket(&bucket)
            .set_create_bucket_configuration(self.location_constraint())
            .send()
            .await;

        if let Err(e) = created {
            let service_error = e.into_service_error();
            if !service_error.is_bucket_already_owned_by_you() {
                return Err(anyhow!(service_error));
            }
            warn!("Bucket {} already exists, applying encryption", bucket);
        }

        let algorithm = match encryption {
            StageEncryption::ServerSide => ServerSideEncryption::Aes256,
        };
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(algorithm)
            .build()?;
        let rule = ServerSideEncryptionRule::builder()
            .apply_server_side_encryption_by_default(by_default)
            .build();
        let sse_config = ServerSideEncryptionConfiguration::builder()
            .rules(rule)
            .build()?;

        // A bucket left without this policy describes as unencrypted and is
        // repaired by the next ensure.
        let res = self
            .client
            .put_bucket_encryption()
            .bucket(&bucket)
            .server_side_encryption_configuration(sse_config)
            .send()
            .await;

        if let Err(e) = res {
            tracing::error!(
                "S3 put_bucket_encryption failed: bucket={}, error={:?}",
                bucket,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn put_object(
        &self,
        stage: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(self.bucket_name(stage))
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn get_object(&self, stage: &str, key: &str) -> Result<Option<ObjectData>> {
        let res = self
            .client
            .get_object()
            .bucket(self.bucket_name(stage))
            .key(key)
            .send()
            .await;

        match res {
            Ok(output) => {
                let content_type = output.content_type.clone();
                let bytes = output.body.collect().await?.into_bytes();
                Ok(Some(ObjectData {
                    bytes,
                    content_type,
                }))
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() || service_error.code() == Some(NO_SUCH_BUCKET) {
                    Ok(None)
                } else {
                    Err(anyhow!(service_error))
                }
            }
        }
    }
}

#[derive(Default)]
struct MemoryStage {
    encryption: Option<StageEncryption>,
    objects: HashMap<String, ObjectData>,
}

/// In-process stages, used in development mode and tests
#[derive(Default)]
pub struct MemoryStageStore {
    stages: DashMap<String, MemoryStage>,
}

impl MemoryStageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StageStore for MemoryStageStore {
    async fn describe_stage(&self, stage: &str) -> Result<Option<StageEncryption>> {
        self.stages
            .get(stage)
            .map(|s| s.encryption)
            .ok_or_else(|| anyhow!("Stage '{}' does not exist", stage))
    }

    async fn create_stage(&self, stage: &str, encryption: StageEncryption) -> Result<()> {
        self.stages.entry(stage.to_string()).or_default().encryption = Some(encryption);
        Ok(())
    }

    async fn put_object(
        &self,
        stage: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<()> {
        let mut entry = self
            .stages
            .get_mut(stage)
            .ok_or_else(|| anyhow!("Stage '{}' does not exist", stage))?;
        entry.objects.insert(
            key.to_string(),
            ObjectData {
                bytes: Bytes::from(data),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn get_object(&self, stage: &str, key: &str) -> Result<Option<ObjectData>> {
        Ok(self
            .stages
            .get(stage)
            .and_then(|entry| entry.objects.get(key).cloned()))
    }
}
