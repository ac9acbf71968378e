pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::inference::{InferenceBackend, InferenceInvoker};
use crate::services::preview::PreviewService;
use crate::services::stage_manager::StageManager;
use crate::services::storage::StageStore;
use crate::services::upload_service::UploadService;
use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::pages::index,
        api::handlers::pages::get_page,
        api::handlers::text::translate,
        api::handlers::text::sentiment,
        api::handlers::text::summarize,
        api::handlers::text::classify,
        api::handlers::text::complete,
        api::handlers::stages::ensure_stage,
        api::handlers::stages::upload_object,
        api::handlers::stages::get_object,
        api::handlers::stages::preview_object,
        api::handlers::stages::analyze_object,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::pages::Language,
            api::handlers::pages::PageDescriptor,
            api::handlers::pages::WelcomeResponse,
            api::handlers::text::TranslateRequest,
            api::handlers::text::TextRequest,
            api::handlers::text::ClassifyRequest,
            api::handlers::text::CompleteRequest,
            api::handlers::text::TextResponse,
            api::handlers::text::SentimentResponse,
            api::handlers::text::ClassifyResponse,
            api::handlers::stages::EnsureStageResponse,
            api::handlers::stages::UploadForm,
            api::handlers::stages::PreviewOutcome,
            api::handlers::stages::UploadResponse,
            api::handlers::stages::AnalyzeRequest,
            api::handlers::stages::AnalyzeResponse,
            services::catalog::Capability,
            services::inference::ObjectRef,
            services::preview::Preview,
            services::preview::Table,
            services::preview::TextEncoding,
            services::stage_manager::StageStatus,
            services::upload_service::StagedObject,
        )
    ),
    tags(
        (name = "pages", description = "Text inference pages"),
        (name = "stages", description = "File staging, preview and multimodal analysis"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub stages: Arc<StageManager>,
    pub uploads: Arc<UploadService>,
    pub previews: Arc<PreviewService>,
    pub inference: Arc<InferenceInvoker>,
    pub config: AppConfig,
}

impl AppState {
    /// Every service shares the one store handle and the one backend handle.
    pub fn new(
        store: Arc<dyn StageStore>,
        backend: Arc<dyn InferenceBackend>,
        config: AppConfig,
    ) -> Self {
        Self {
            stages: Arc::new(StageManager::new(store.clone())),
            uploads: Arc::new(UploadService::new(store.clone(), config.max_upload_size)),
            previews: Arc::new(PreviewService::new(store, config.preview_row_limit)),
            inference: Arc::new(InferenceInvoker::new(backend)),
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_size + 1024 * 1024; // multipart overhead

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get(api::middleware::request_id::REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::pages::index))
        .route("/health", get(api::handlers::health::health_check))
        .route("/pages/:slug", get(api::handlers::pages::get_page))
        .route("/translate", post(api::handlers::text::translate))
        .route("/sentiment", post(api::handlers::text::sentiment))
        .route("/summarize", post(api::handlers::text::summarize))
        .route("/classify", post(api::handlers::text::classify))
        .route("/complete/:slug", post(api::handlers::text::complete))
        .route("/stages/:stage", post(api::handlers::stages::ensure_stage))
        .route(
            "/stages/:stage/objects",
            post(api::handlers::stages::upload_object)
                .layer(axum::extract::DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/stages/:stage/objects/:key",
            get(api::handlers::stages::get_object),
        )
        .route(
            "/stages/:stage/objects/:key/preview",
            get(api::handlers::stages::preview_object),
        )
        .route(
            "/stages/:stage/objects/:key/analyze",
            post(api::handlers::stages::analyze_object),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(

            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(trace_layer)
        // Outermost, so the trace span already sees the assigned id.
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}
