mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{setup_app, setup_app_with_config};
use genai_tools::config::AppConfig;
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_staged_file_pages_name_their_stage() {
    let mut config = AppConfig::development();
    config.default_stage = "media_stage".to_string();
    let test = setup_app_with_config(config);

    let (status, json) = get_json(&test.app, "/pages/image-analysis").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stage"], "media_stage");
    assert_eq!(json["models"], serde_json::json!(["claude-3-5-sonnet", "pixtral-large"]));

    let (_, json) = get_json(&test.app, "/pages/audio-transcription").await;
    assert_eq!(json["stage"], "media_stage");

    let (_, json) = get_json(&test.app, "/pages/translate").await;
    assert!(json.get("stage").is_none());
    assert_eq!(json["languages"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_index_lists_every_page() {
    let test = setup_app();

    let (status, json) = get_json(&test.app, "/").await;

    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<&str> = json["pages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["slug"].as_str())
        .collect();
    assert_eq!(slugs.len(), 10);
    assert!(slugs.contains(&"audio-transcription"));
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_generated_request_id_reaches_trace_span() {
    let test = setup_app();
    let logs = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = test
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains(&format!("request_id={}", request_id)));
    assert!(!output.contains("request_id=unknown"));
}

#[tokio::test]
async fn test_caller_request_id_is_kept() {
    let test = setup_app();

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-42");
}
