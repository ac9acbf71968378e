use crate::AppState;
use crate::config::StorageBackend;
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub storage: String,
    pub default_stage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let storage = match state.config.storage_backend {
        StorageBackend::S3 => "s3",
        StorageBackend::Memory => "memory",
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        storage: storage.to_string(),
        default_stage: state.config.default_stage.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
