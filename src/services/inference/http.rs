use super::{InferenceBackend, InferenceCall};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Deserialize)]
struct InferenceEnvelope {
    result: Value,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: String,
}

/// JSON-over-HTTP inference backend.
pub struct HttpInferenceBackend {
    client: Client,
    url: Url,
    api_token: Option<String>,
}

impl HttpInferenceBackend {
    pub fn new(endpoint: &str, api_token: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let url = inference_url(endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            url,
            api_token,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// `{endpoint}/v1/inference`, keeping any path the endpoint already has.
pub fn inference_url(endpoint: &str) -> Result<Url> {
    let mut base = Url::parse(endpoint)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join("v1/inference")?)
}

#[async_trait]
impl InferenceBackend for HttpInferenceBackend {
    async fn execute(&self, call: &InferenceCall) -> Result<Value> {
        let mut req = self.client.post(self.url.clone()).json(call);
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let res = req.send().await?;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(anyhow!("inference backend returned {}: {}", status, message));
        }

        let envelope: InferenceEnvelope = res.json().await?;
        Ok(envelope.result)
    }
}
