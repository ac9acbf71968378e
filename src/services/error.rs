use thiserror::Error;

/// Failures surfaced to the caller of a page operation.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Describe and create both failed; the current page must stop.
    #[error("Failed to create stage '{stage}': {reason}")]
    StageUnavailable { stage: String, reason: String },

    #[error("Error occurred while uploading file '{key}': {reason}")]
    UploadFailed { key: String, reason: String },

    #[error("File '{key}' not found in stage '{stage}'")]
    ObjectNotFound { stage: String, key: String },

    #[error("Failed to read '{key}' from stage '{stage}': {reason}")]
    ReadFailed {
        stage: String,
        key: String,
        reason: String,
    },

    #[error("Could not preview '{key}': {reason}")]
    DecodeFailed { key: String, reason: String },

    #[error("Inference call failed: {0}")]
    InferenceCallFailed(String),

    #[error("Model '{model}' is not available for {page}")]
    UnsupportedModel { model: String, page: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    PayloadTooLarge(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
