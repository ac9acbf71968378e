use std::env;

/// Which object store backs the stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "s3" | "minio" => Some(Self::S3),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Stage used by the image and audio pages (default: "images_stage")
    pub default_stage: String,

    /// Maximum upload size in bytes (default: 50 MB)
    pub max_upload_size: usize,

    /// Rows shown by the tabular preview (default: 20)
    pub preview_row_limit: usize,

    /// Object store backing the stages (default: S3)
    pub storage_backend: StorageBackend,

    /// Custom S3-compatible endpoint, e.g. MinIO
    pub s3_endpoint: Option<String>,
    /// S3 region (default: "us-east-1")
    pub s3_region: String,
    /// Static access key; the ambient credential chain is used when unset
    pub s3_access_key: Option<String>,
    /// Static secret key
    pub s3_secret_key: Option<String>,
    /// Prefix prepended to stage names when mapped to buckets
    pub s3_bucket_prefix: String,

    /// Base URL of the inference backend
    pub inference_endpoint: String,
    /// Bearer token for the inference backend
    pub inference_api_token: Option<String>,
    /// Transport timeout for inference calls; transport default when unset
    pub inference_timeout_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_stage: "images_stage".to_string(),
            max_upload_size: 50 * 1024 * 1024, // 50 MB
            preview_row_limit: 20,
            storage_backend: StorageBackend::S3,
            s3_endpoint: None,
            s3_region: "us-east-1".to_string(),
            s3_access_key: None,
            s3_secret_key: None,
            s3_bucket_prefix: String::new(),
            inference_endpoint: "http://127.0.0.1:8080/".to_string(),
            inference_api_token: None,
            inference_timeout_secs: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            default_stage: env::var("DEFAULT_STAGE").unwrap_or(default.default_stage),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            preview_row_limit: env::var("PREVIEW_ROW_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|limit: &usize| *limit > 0)
                .unwrap_or(default.preview_row_limit),

            storage_backend: env::var("STORAGE_BACKEND")
                .ok()
                .and_then(|v| StorageBackend::parse(&v))
                .unwrap_or(default.storage_backend),

            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
            s3_bucket_prefix: env::var("S3_BUCKET_PREFIX").unwrap_or(default.s3_bucket_prefix),

            inference_endpoint: env::var("INFERENCE_ENDPOINT")
                .unwrap_or(default.inference_endpoint),
            inference_api_token: env::var("INFERENCE_API_TOKEN")
                .ok()
                .filter(|v| !v.is_empty()),
            inference_timeout_secs: env::var("INFERENCE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Create config for development (in-memory stages, local backend)
    pub fn development() -> Self {
        Self {
            storage_backend: StorageBackend::Memory,
            ..Self::default()
        }
    }
}
