//! Remote inference: request construction, the backend seam, and the invoker
//! the pages call.
//!
//! Every call is sent as a structured [`InferenceCall`]. User text travels in
//! its own field and is never spliced into a query string.

pub mod http;

use crate::services::catalog::Capability;
use crate::services::error::{ServiceError, ServiceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

pub use http::HttpInferenceBackend;

/// A staged file handed to a multimodal model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ObjectRef {
    pub stage: String,
    pub key: String,
}

/// Wire body of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum InferenceCall {
    Complete {
        model: String,
        prompt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<ObjectRef>,
    },
    Translate {
        text: String,
        source_language: String,
        target_language: String,
    },
    Sentiment {
        text: String,
    },
    Summarize {
        text: String,
    },
    ClassifyText {
        text: String,
        categories: Vec<String>,
    },
    Transcribe {
        file: ObjectRef,
    },
}

/// Model, instruction, optional text payload and optional staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub model: String,
    pub instruction: String,
    pub payload: Option<String>,
    pub file: Option<ObjectRef>,
}

impl InferenceRequest {
    pub fn new(model: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instruction: instruction.into(),
            payload: None,
            file: None,
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn with_file(mut self, file: ObjectRef) -> Self {
        self.file = Some(file);
        self
    }

    /// `[INST]instruction\n\npayload[/INST]` for text calls. Calls carrying a
    /// file send the instruction (and payload, if any) unwrapped.
    pub fn prompt(&self) -> String {
        let instruction = self.instruction.trim();
        let body = match self.payload.as_deref().map(str::trim) {
            Some(payload) if !payload.is_empty() && !instruction.is_empty() => {
                format!("{}\n\n{}", instruction, payload)
            }
            Some(payload) if !payload.is_empty() => payload.to_string(),
            _ => instruction.to_string(),
        };

        if self.file.is_some() {
            body
        } else {
            format!("[INST]{}[/INST]", body)
        }
    }

    pub fn to_call(&self) -> InferenceCall {
        InferenceCall::Complete {
            model: self.model.clone(),
            prompt: self.prompt(),
            file: self.file.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        self.instruction.trim().is_empty()
            && self.payload.as_deref().is_none_or(|p| p.trim().is_empty())
    }
}

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Executes one call and returns the raw result value.
    async fn execute(&self, call: &InferenceCall) -> anyhow::Result<Value>;
}

pub struct InferenceInvoker {
    backend: Arc<dyn InferenceBackend>,
}

impl InferenceInvoker {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    /// Freeform completion for a page. The model must be on that page's allow-list.
    pub async fn invoke(
        &self,
        capability: Capability,
        request: InferenceRequest,
    ) -> ServiceResult<String> {
        if !capability.models().contains(&request.model.as_str()) {
            return Err(ServiceError::UnsupportedModel {
                model: request.model,
                page: capability.title().to_string(),
            });
        }
        if request.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Please provide instructions or data for the model".to_string(),
            ));
        }

        let value = self.call(request.to_call()).await?;
        expect_text(value)
    }

    pub async fn translate(&self, text: &str, from: &str, to: &str) -> ServiceResult<String> {
        let text = require_text(text)?;
        let value = self
            .call(InferenceCall::Translate {
                text,
                source_language: from.to_string(),
                target_language: to.to_string(),
            })
            .await?;
        expect_text(value)
    }

    /// Score between -1 (most negative) and 1 (most positive).
    pub async fn sentiment(&self, text: &str) -> ServiceResult<f64> {
        let text = require_text(text)?;
        let value = self.call(InferenceCall::Sentiment { text }).await?;

        let score = value
            .as_f64()
            .or_else(|| value.get("sentiment").and_then(Value::as_f64))
            .ok_or_else(|| unexpected_shape("sentiment score", &value))?;

        if !(-1.0..=1.0).contains(&score) {
            return Err(ServiceError::InferenceCallFailed(format!(
                "sentiment score {} is outside [-1, 1]",
                score
            )));
        }
        Ok(score)
    }

    pub async fn summarize(&self, text: &str) -> ServiceResult<String> {
        let text = require_text(text)?;
        let value = self.call(InferenceCall::Summarize { text }).await?;
        expect_text(value)
    }

    pub async fn classify(&self, text: &str, categories: &[String]) -> ServiceResult<String> {
        let text = require_text(text)?;
        if categories.len() < 2 {
            return Err(ServiceError::InvalidInput(
                "At least two categories are required".to_string(),
            ));
        }

        let value = self
            .call(InferenceCall::ClassifyText {
                text,
                categories: categories.to_vec(),
            })
            .await?;

        match value.get("label").and_then(Value::as_str) {
            Some(label) => Ok(label.to_string()),
            None => expect_text(value),
        }
    }

    /// Speech-to-text over a staged audio file. No model selection applies.
    pub async fn transcribe(&self, file: ObjectRef) -> ServiceResult<String> {
        let value = self.call(InferenceCall::Transcribe { file }).await?;

        match value.get("text").and_then(Value::as_str) {
            Some(text) => Ok(text.to_string()),
            None => expect_text(value),
        }
    }

    async fn call(&self, call: InferenceCall) -> ServiceResult<Value> {
        match self.backend.execute(&call).await {
            Ok(value) => {
                info!("🤖 Inference call completed");
                Ok(value)
            }
            Err(e) => {
                error!("❌ Inference call failed: {:?}", e);
                Err(ServiceError::InferenceCallFailed(e.to_string()))
            }
        }
    }
}

fn require_text(text: &str) -> ServiceResult<String> {
    if text.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Please enter some text".to_string()));
    }
    Ok(text.to_string())
}

fn expect_text(value: Value) -> ServiceResult<String> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(unexpected_shape("text", &other)),
    }
}

fn unexpected_shape(expected: &str, value: &Value) -> ServiceError {
    ServiceError::InferenceCallFailed(format!("expected {} in response, got {}", expected, value))
}
