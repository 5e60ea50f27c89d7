use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState};
use crate::services::probe::ReachabilityProbe;
use crate::services::storage::MemoryBlobStore;

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) probe: Arc<FakeProbe>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("ASSIGNMENTS_ENV", "test");
    std::env::set_var("ASSIGNMENTS_STRICT_CONFIG", "0");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("ENVIRONMENT");
    std::env::remove_var("ASSIGNMENTS_HOST");
    std::env::remove_var("ASSIGNMENTS_PORT");
    std::env::remove_var("API_V1_STR");
    std::env::remove_var("PUBLIC_BASE_URL");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
    std::env::remove_var("INTERACTIVITIES_HOST");
    std::env::remove_var("PROBLEM_REPOSITORY_HOST");
    std::env::remove_var("PROBE_TIMEOUT_SECONDS");
    std::env::remove_var("S3_ENDPOINT");
    std::env::remove_var("S3_ACCESS_KEY");
    std::env::remove_var("S3_SECRET_KEY");
    std::env::remove_var("S3_BUCKET");
    std::env::remove_var("S3_REGION");
    std::env::set_var("AWS_EC2_METADATA_DISABLED", "true");
}

pub(crate) fn set_test_storage_env() {
    std::env::set_var("S3_ENDPOINT", "http://localhost:9000");
    std::env::set_var("S3_ACCESS_KEY", "test-access-key");
    std::env::set_var("S3_SECRET_KEY", "test-secret-key");
    std::env::set_var("S3_BUCKET", "assignments-test-bucket");
    std::env::set_var("S3_REGION", "us-west-1");
}

/// Probe answering from a fixed set of URLs and recording every question.
#[derive(Debug, Default)]
pub(crate) struct FakeProbe {
    reachable: Option<HashSet<String>>,
    calls: StdMutex<Vec<String>>,
}

impl FakeProbe {
    pub(crate) fn all_reachable() -> Self {
        Self { reachable: None, calls: StdMutex::new(Vec::new()) }
    }

    pub(crate) fn reachable<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reachable: Some(urls.into_iter().map(Into::into).collect()),
            calls: StdMutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("probe calls").clone()
    }
}

#[async_trait]
impl ReachabilityProbe for FakeProbe {
    async fn exists(&self, url: &str) -> bool {
        self.calls.lock().expect("probe calls").push(url.to_string());
        self.reachable.as_ref().map_or(true, |reachable| reachable.contains(url))
    }
}

pub(crate) async fn setup_test_context() -> TestContext {
    setup_test_context_with_probe(FakeProbe::all_reachable()).await
}

pub(crate) async fn setup_test_context_with_probe(probe: FakeProbe) -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let probe = Arc::new(probe);
    let state = AppState::new(settings, Arc::new(MemoryBlobStore::new()), probe.clone());
    let app = api::router::router(state.clone());

    TestContext { state, app, probe, _guard: guard }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
