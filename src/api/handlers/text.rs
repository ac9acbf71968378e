use crate::AppState;
use crate::api::error::AppError;
use crate::services::catalog::{CLASSIFY_CATEGORIES, Capability, language_code};
use crate::services::inference::InferenceRequest;
use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct TranslateRequest {
    pub text: String,
    /// Language name or code, e.g. "German" or "de"
    pub from: String,
    pub to: String,
}

#[derive(Deserialize, ToSchema)]
pub struct TextRequest {
    pub text: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ClassifyRequest {
    pub text: String,
    /// Defaults to Refund, Exchange, No Category
    pub categories: Option<Vec<String>>,
}

#[derive(Deserialize, ToSchema)]
pub struct CompleteRequest {
    pub model: String,
    /// Falls back to the page's default instruction
    pub instruction: Option<String>,
    pub text: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TextResponse {
    pub response: String,
}

#[derive(Serialize, ToSchema)]
pub struct SentimentResponse {
    /// -1 = most negative, 0 = neutral, 1 = most positive
    pub sentiment: f64,
}

#[derive(Serialize, ToSchema)]
pub struct ClassifyResponse {
    pub answer: String,
}

fn resolve_language(language: &str) -> Result<&'static str, AppError> {
    language_code(language)
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported language '{}'", language)))
}

#[utoipa::path(
    post,
    path = "/translate",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translated text", body = TextResponse),
        (status = 400, description = "Empty text or unsupported language"),
        (status = 502, description = "Inference call failed")
    ),
    tag = "pages"
)]
pub async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let from = resolve_language(&req.from)?;
    let to = resolve_language(&req.to)?;

    let response = state.inference.translate(&req.text, from, to).await?;
    Ok(Json(TextResponse { response }))
}

#[utoipa::path(
    post,
    path = "/sentiment",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Sentiment score", body = SentimentResponse),
        (status = 502, description = "Inference call failed")
    ),
    tag = "pages"
)]
pub async fn sentiment(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    let sentiment = state.inference.sentiment(&req.text).await?;
    Ok(Json(SentimentResponse { sentiment }))
}

#[utoipa::path(
    post,
    path = "/summarize",
    request_body = TextRequest,
    responses(
        (status = 200, description = "Summary", body = TextResponse),
        (status = 502, description = "Inference call failed")
    ),
    tag = "pages"
)]
pub async fn summarize(
    State(state): State<AppState>,
    Json(req): Json<TextRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let response = state.inference.summarize(&req.text).await?;
    Ok(Json(TextResponse { response }))
}

#[utoipa::path(
    post,
    path = "/classify",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Assigned category", body = ClassifyResponse),
        (status = 502, description = "Inference call failed")
    ),
    tag = "pages"
)]
pub async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let categories = req
        .categories
        .unwrap_or_else(|| CLASSIFY_CATEGORIES.iter().map(|c| c.to_string()).collect());

    let answer = state.inference.classify(&req.text, &categories).await?;
    Ok(Json(ClassifyResponse { answer }))
}

#[utoipa::path(
    post,
    path = "/complete/{slug}",
    request_body = CompleteRequest,
    params(
        ("slug" = String, Path, description = "next-best-action, generate-email, ask-question or code-conversion")
    ),
    responses(
        (status = 200, description = "Model answer", body = TextResponse),
        (status = 400, description = "Model not offered on this page"),
        (status = 404, description = "Unknown page"),
        (status = 502, description = "Inference call failed")
    ),
    tag = "pages"
)]
pub async fn complete(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<TextResponse>, AppError> {
    let capability = Capability::from_slug(&slug)
        .filter(Capability::is_completion)
        .ok_or_else(|| AppError::NotFound(format!("Completion page '{}' not found", slug)))?;

    let instruction = req
        .instruction
        .or_else(|| capability.default_instruction().map(str::to_string))
        .unwrap_or_default();

    let mut request = InferenceRequest::new(req.model, instruction);
    if let Some(text) = req.text {
        request = request.with_payload(text);
    }

    let response = state.inference.invoke(capability, request).await?;
    Ok(Json(TextResponse { response }))
}
