use crate::AppState;
use crate::api::error::AppError;
use crate::services::catalog::{Capability, DEFAULT_IMAGE_PROMPT};
use crate::services::inference::{InferenceRequest, ObjectRef};
use crate::services::preview::{Preview, PreviewKind, preview_kind};
use crate::services::stage_manager::StageStatus;
use crate::services::upload_service::StagedObject;
use crate::utils::validation::{sanitize_object_key, validate_stage_name};
use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartError,
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct EnsureStageResponse {
    pub stage: String,
    pub status: StageStatus,
}

/// Multipart form for uploads
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Outcome of reading an upload back for display. A failed preview does
/// not fail the upload.
#[derive(Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewOutcome {
    Ready { preview: Preview },
    Failed { message: String },
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub stage_status: StageStatus,
    pub object: StagedObject,
    pub preview: PreviewOutcome,
}

#[derive(Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Required for images; audio is transcribed without a model choice
    pub model: Option<String>,
    /// Defaults to a short image description prompt
    pub prompt: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AnalyzeResponse {
    pub object: ObjectRef,
    pub capability: Capability,
    pub response: String,
}

/// Body-limit rejections surface as 413, anything else is a malformed request.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, e.body_text()))
    } else {
        AppError::BadRequest(format!("{}: {}", context, e.body_text()))
    }
}

#[utoipa::path(
    post,
    path = "/stages/{stage}",
    params(
        ("stage" = String, Path, description = "Stage name")
    ),
    responses(
        (status = 200, description = "Stage exists", body = EnsureStageResponse),
        (status = 503, description = "Stage could not be created")
    ),
    tag = "stages"
)]
pub async fn ensure_stage(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> Result<Json<EnsureStageResponse>, AppError> {
    let status = state.stages.ensure_stage_exists(&stage).await?;
    Ok(Json(EnsureStageResponse { stage, status }))
}

#[utoipa::path(
    post,
    path = "/stages/{stage}/objects",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    params(
        ("stage" = String, Path, description = "Stage name")
    ),
    responses(
        (status = 200, description = "File staged", body = UploadResponse),
        (status = 400, description = "Missing or invalid file"),
        (status = 413, description = "File too large"),
        (status = 502, description = "Upload failed, retry is possible"),
        (status = 503, description = "Stage could not be created")
    ),
    tag = "stages"
)]
pub async fn upload_object(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    // Nothing runs on this page without a stage.
    let stage_status = state.stages.ensure_stage_exists(&stage).await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Invalid multipart body", e))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error("Failed to read upload", e))?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) =
        upload.ok_or_else(|| AppError::BadRequest("Choose a file to upload".to_string()))?;

    let object = state.uploads.upload(&stage, &filename, data.to_vec()).await?;

    let preview = match state.previews.preview(&stage, &object.key).await {
        Ok(preview) => PreviewOutcome::Ready { preview },
        Err(e) => {
            warn!("Preview of '{}' failed: {}", object.key, e);
            PreviewOutcome::Failed {
                message: e.to_string(),
            }
        }
    };

    Ok(Json(UploadResponse {
        stage_status,
        object,
        preview,
    }))
}

#[utoipa::path(
    get,
    path = "/stages/{stage}/objects/{key}",
    params(
        ("stage" = String, Path, description = "Stage name"),
        ("key" = String, Path, description = "Object key (original file name)")
    ),
    responses(
        (status = 200, description = "Raw object bytes"),
        (status = 404, description = "Object not found")
    ),
    tag = "stages"
)]
pub async fn get_object(
    State(state): State<AppState>,
    Path((stage, key)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let object = state.previews.read_object(&stage, &key).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, "inline".to_string()),
        ],
        object.bytes,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/stages/{stage}/objects/{key}/preview",
    params(
        ("stage" = String, Path, description = "Stage name"),
        ("key" = String, Path, description = "Object key (original file name)")
    ),
    responses(
        (status = 200, description = "Preview of the object", body = Preview),
        (status = 404, description = "Object not found"),
        (status = 422, description = "Object could not be decoded as delimited text")
    ),
    tag = "stages"
)]
pub async fn preview_object(
    State(state): State<AppState>,
    Path((stage, key)): Path<(String, String)>,
) -> Result<Json<Preview>, AppError> {
    let preview = state.previews.preview(&stage, &key).await?;
    Ok(Json(preview))
}

#[utoipa::path(
    post,
    path = "/stages/{stage}/objects/{key}/analyze",
    request_body = AnalyzeRequest,
    params(
        ("stage" = String, Path, description = "Stage name"),
        ("key" = String, Path, description = "Object key (original file name)")
    ),
    responses(
        (status = 200, description = "Image description or audio transcript", body = AnalyzeResponse),
        (status = 400, description = "Model not offered, or file type cannot be analyzed"),
        (status = 502, description = "Inference call failed")
    ),
    tag = "stages"
)]
pub async fn analyze_object(
    State(state): State<AppState>,
    Path((stage, key)): Path<(String, String)>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    validate_stage_name(&stage).map_err(|e| AppError::BadRequest(e.message))?;
    if sanitize_object_key(&key).ok().as_deref() != Some(key.as_str()) {
        return Err(AppError::BadRequest(format!("Invalid object key '{}'", key)));
    }

    let kind = preview_kind(&key);
    let object = ObjectRef { stage, key };

    let (capability, response) = match kind {
        PreviewKind::Image => {
            let model = req
                .model
                .filter(|m| !m.trim().is_empty())
                .ok_or_else(|| AppError::BadRequest("Choose a model".to_string()))?;
            let prompt = req
                .prompt
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_PROMPT.to_string());

            let request = InferenceRequest::new(model, prompt).with_file(object.clone());
            let response = state
                .inference
                .invoke(Capability::ImageAnalysis, request)
                .await?;
            (Capability::ImageAnalysis, response)
        }
        PreviewKind::Audio => {
            let response = state.inference.transcribe(object.clone()).await?;
            (Capability::AudioTranscription, response)
        }
        _ => {
            return Err(AppError::BadRequest(format!(
                "'{}' is neither an image nor an audio file",
                object.key
            )));
        }
    };

    Ok(Json(AnalyzeResponse {
        object,
        capability,
        response,
    }))
}
