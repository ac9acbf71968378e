use crate::services::error::ServiceError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    /// The page cannot continue; nothing after this step runs.
    #[error("Service Unavailable: {0}")]
    Halted(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::StageUnavailable { .. } => AppError::Halted(message),
            ServiceError::UploadFailed { .. } | ServiceError::InferenceCallFailed(_) => {
                AppError::BadGateway(message)
            }
            ServiceError::ObjectNotFound { .. } => AppError::NotFound(message),
            ServiceError::ReadFailed { .. } => AppError::Internal(message),
            ServiceError::DecodeFailed { .. } => AppError::Unprocessable(message),
            ServiceError::UnsupportedModel { .. } | ServiceError::InvalidInput(_) => {
                AppError::BadRequest(message)
            }
            ServiceError::PayloadTooLarge(_) => AppError::PayloadTooLarge(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::BadGateway(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Halted(msg) => {
                tracing::error!("Page halted: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
