#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use genai_tools::config::AppConfig;
use genai_tools::services::inference::{InferenceBackend, InferenceCall};
use genai_tools::services::storage::{MemoryStageStore, ObjectData, StageEncryption, StageStore};
use genai_tools::{AppState, create_app};
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory stages that count calls and can be told to fail.
pub struct MockStageStore {
    inner: MemoryStageStore,
    pub describe_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_put: AtomicBool,
    /// Create the stage but fail while applying its encryption
    pub fail_encryption: AtomicBool,
    unencrypted: Mutex<HashSet<String>>,
    pub created_with: Mutex<Vec<(String, StageEncryption)>>,
}

impl MockStageStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStageStore::new(),
            describe_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            put_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            fail_create: AtomicBool::new(false),
            fail_put: AtomicBool::new(false),
            fail_encryption: AtomicBool::new(false),
            unencrypted: Mutex::new(HashSet::new()),
            created_with: Mutex::new(Vec::new()),
        }
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StageStore for MockStageStore {
    async fn describe_stage(&self, stage: &str) -> anyhow::Result<Option<StageEncryption>> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let encryption = self.inner.describe_stage(stage).await?;
        if self.unencrypted.lock().unwrap().contains(stage) {
            return Ok(None);
        }
        Ok(encryption)
    }

    async fn create_stage(&self, stage: &str, encryption: StageEncryption) -> anyhow::Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Insufficient privileges to create stage"));
        }
        if self.fail_encryption.load(Ordering::SeqCst) {
            self.inner.create_stage(stage, encryption).await?;
            self.unencrypted.lock().unwrap().insert(stage.to_string());
            return Err(anyhow::anyhow!("put_bucket_encryption: AccessDenied"));
        }
        self.unencrypted.lock().unwrap().remove(stage);
        self.created_with
            .lock()
            .unwrap()
            .push((stage.to_string(), encryption));
        self.inner.create_stage(stage, encryption).await
    }

    async fn put_object(
        &self,
        stage: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<&str>,
    ) -> anyhow::Result<()> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Connection reset by peer"));
        }
        self.inner.put_object(stage, key, data, content_type).await
    }

    async fn get_object(&self, stage: &str, key: &str) -> anyhow::Result<Option<ObjectData>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(stage, key).await
    }
}

/// Records every call and answers from a script; answers `"ok"` once the
/// script runs out.
pub struct MockInferenceBackend {
    pub calls: Mutex<Vec<InferenceCall>>,
    responses: Mutex<VecDeque<Result<Value, String>>>,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn respond(&self, response: Result<Value, &str>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(response.map_err(str::to_string));
    }

    pub fn recorded(&self) -> Vec<InferenceCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    async fn execute(&self, call: &InferenceCall) -> anyhow::Result<Value> {
        self.calls.lock().unwrap().push(call.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(Value::String("ok".to_string())),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MockStageStore>,
    pub backend: Arc<MockInferenceBackend>,
}

pub fn setup_app() -> TestApp {
    setup_app_with_config(AppConfig::development())
}

pub fn setup_app_with_config(config: AppConfig) -> TestApp {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let store = Arc::new(MockStageStore::new());
    let backend = Arc::new(MockInferenceBackend::new());
    let state = AppState::new(store.clone(), backend.clone(), config);

    TestApp {
        app: create_app(state.clone()),
        state,
        store,
        backend,
    }
}

pub fn multipart_body(boundary: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{boundary}\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
        Content-Type: application/octet-stream\r\n\r\n",
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
