use crate::config::AppConfig;
use crate::services::inference::{HttpInferenceBackend, InferenceBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub fn setup_inference(config: &AppConfig) -> anyhow::Result<Arc<dyn InferenceBackend>> {
    let backend = HttpInferenceBackend::new(
        &config.inference_endpoint,
        config.inference_api_token.clone(),
        config.inference_timeout_secs.map(Duration::from_secs),
    )?;

    info!(
        "🤖 Inference backend: {} (auth: {})",
        backend.url(),
        if config.inference_api_token.is_some() { "bearer" } else { "none" }
    );

    Ok(Arc::new(backend))
}
