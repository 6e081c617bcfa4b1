//! Shared fixtures: an in-process stand-in for the remote analysis service
//! and an in-memory result store.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use docscan::{AnalyzerConfig, AnalyzerConfigBuilder, PersistedRecord, ResultStore, StoreError};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const API_KEY: &str = "test-key";

/// How the fake answers the submit call.
#[derive(Clone, Debug)]
pub enum SubmitBehavior {
    Accept,
    Reject(u16, &'static str),
    NoLocation,
}

/// One request the fake received on the analyze route.
#[derive(Clone, Debug)]
pub struct SeenSubmit {
    pub model_action: String,
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Clone)]
struct FakeState {
    base: String,
    submit: SubmitBehavior,
    polls: Arc<Vec<(u16, Value)>>,
    submits: Arc<Mutex<Vec<SeenSubmit>>>,
    poll_count: Arc<AtomicUsize>,
    poll_keys: Arc<Mutex<Vec<Option<String>>>>,
}

/// Handle to a running fake analysis service.
pub struct FakeService {
    pub base: String,
    state: FakeState,
}

impl FakeService {
    /// Start a fake that answers polls with `polls` in order, repeating the
    /// last entry once the script is exhausted.
    pub async fn start(submit: SubmitBehavior, polls: Vec<(u16, Value)>) -> Self {
        init_tracing();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake service");
        let base = format!("http://{}", listener.local_addr().unwrap());

        let state = FakeState {
            base: base.clone(),
            submit,
            polls: Arc::new(polls),
            submits: Arc::new(Mutex::new(Vec::new())),
            poll_count: Arc::new(AtomicUsize::new(0)),
            poll_keys: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/formrecognizer/documentModels/:model", post(analyze))
            .route("/operations/:id", get(operation))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self { base, state }
    }

    /// Shorthand for an accepting fake with JSON poll bodies (all HTTP 200).
    pub async fn accepting(polls: Vec<Value>) -> Self {
        Self::start(
            SubmitBehavior::Accept,
            polls.into_iter().map(|p| (200, p)).collect(),
        )
        .await
    }

    pub fn submits(&self) -> Vec<SeenSubmit> {
        self.state.submits.lock().unwrap().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.state.poll_count.load(Ordering::SeqCst)
    }

    pub fn poll_keys(&self) -> Vec<Option<String>> {
        self.state.poll_keys.lock().unwrap().clone()
    }

    /// Config pointing at this fake, with a short poll interval.
    pub fn config(&self) -> AnalyzerConfigBuilder {
        AnalyzerConfig::builder()
            .endpoint(&self.base)
            .api_key(API_KEY)
            .poll_interval_ms(5)
    }
}

/// Route library logs through the test harness; `RUST_LOG=docscan=debug`
/// shows them for a failing test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn analyze(
    State(state): State<FakeState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.submits.lock().unwrap().push(SeenSubmit {
        model_action,
        api_key: header(&headers, "Ocp-Apim-Subscription-Key"),
        content_type: header(&headers, "content-type"),
        body: body.to_vec(),
    });

    match state.submit {
        SubmitBehavior::Accept => (
            StatusCode::ACCEPTED,
            [("Operation-Location", format!("{}/operations/job-1?api-version=2023-07-31", state.base))],
        )
            .into_response(),
        SubmitBehavior::Reject(status, body) => {
            (StatusCode::from_u16(status).unwrap(), body).into_response()
        }
        SubmitBehavior::NoLocation => StatusCode::ACCEPTED.into_response(),
    }
}

async fn operation(
    State(state): State<FakeState>,
    Path(_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let n = state.poll_count.fetch_add(1, Ordering::SeqCst);
    state
        .poll_keys
        .lock()
        .unwrap()
        .push(header(&headers, "Ocp-Apim-Subscription-Key"));

    let idx = n.min(state.polls.len().saturating_sub(1));
    match state.polls.get(idx) {
        Some((status, body)) => {
            (StatusCode::from_u16(*status).unwrap(), Json(body.clone())).into_response()
        }
        None => (StatusCode::OK, Json(json!({"status": "running"}))).into_response(),
    }
}

// ── Poll body helpers ────────────────────────────────────────────────────────

pub fn running() -> Value {
    json!({"status": "running", "createdDateTime": "2024-05-01T00:00:00Z"})
}

pub fn not_started() -> Value {
    json!({"status": "notStarted"})
}

pub fn succeeded(analyze_result: Value) -> Value {
    json!({"status": "succeeded", "analyzeResult": analyze_result})
}

pub fn failed() -> Value {
    json!({
        "status": "failed",
        "error": {"code": "InvalidContent", "message": "The file is corrupted."}
    })
}

pub fn layout_result() -> Value {
    json!({
        "apiVersion": "2023-07-31",
        "modelId": "prebuilt-layout",
        "content": "Agree [x]\nDecline [ ]",
        "pages": [{
            "pageNumber": 1,
            "width": 8.5,
            "height": 11,
            "unit": "inch",
            "selectionMarks": [
                {"state": "selected", "polygon": [1.0, 1.0, 1.2, 1.0, 1.2, 1.2, 1.0, 1.2], "confidence": 0.98},
                {"state": "unselected", "polygon": [1.0, 2.0, 1.2, 2.0, 1.2, 2.2, 1.0, 2.2], "confidence": 0.97}
            ]
        }]
    })
}

// ── Store ────────────────────────────────────────────────────────────────────

/// Keeps records in memory, or refuses every insert when `failing`.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Mutex<Vec<PersistedRecord>>,
    pub failing: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        if self.failing {
            return Err(StoreError::Rejected {
                status: 503,
                body: "database is read-only".into(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// A small PNG with enough texture to look like a photo.
pub fn sample_png() -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    let img = RgbImage::from_fn(128, 128, |x, y| {
        let n = ((x * 31 + y * 17) % 97) as u8;
        Rgb([x as u8, y as u8 ^ n, n])
    });
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}
