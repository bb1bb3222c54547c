//! Shared helpers for integration tests.
//!
//! Builds the full router against a wiremock upstream with a fixed
//! credential and a sleeper that never waits.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use kabu::api::{create_router, AppState};
use kabu::config::GatewayConfig;
use kabu::gateway::AnalysisGateway;
use kabu::resilience::{RetryPolicy, Sleeper};
use kabu::upstream::{CredentialSource, GeminiInvoker, StaticCredential};
use serde_json::{json, Value};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tower::Service;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-key-do-not-leak";

/// Gemini path for the default model.
pub const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn test_config(mock: &MockServer) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.upstream.base_url = mock.uri();
    config.upstream.timeout_seconds = 5;
    config
}

pub struct TestApp {
    pub router: axum::Router,
    pub sleeper: Arc<RecordingSleeper>,
}

/// Router wired to `mock`, using the given credential source.
pub fn build_app_with(mock: &MockServer, credentials: Arc<dyn CredentialSource>) -> TestApp {
    build_app_with_config(mock, credentials, |_| {})
}

/// Router wired to `mock` after `adjust` has edited the test config.
pub fn build_app_with_config(
    mock: &MockServer,
    credentials: Arc<dyn CredentialSource>,
    adjust: impl FnOnce(&mut GatewayConfig),
) -> TestApp {
    let mut config = test_config(mock);
    adjust(&mut config);
    let invoker = GeminiInvoker::from_config(&config.upstream).unwrap();
    let sleeper = Arc::new(RecordingSleeper::default());

    let gateway = AnalysisGateway::new(
        Arc::new(invoker),
        credentials,
        RetryPolicy::from(&config.retry),
    )
    .with_sleeper(sleeper.clone());

    let state = Arc::new(AppState::new(Arc::new(config), Arc::new(gateway)));
    TestApp {
        router: create_router(state),
        sleeper,
    }
}

pub fn build_app(mock: &MockServer) -> TestApp {
    build_app_with(mock, Arc::new(StaticCredential::new(TEST_API_KEY)))
}

/// A successful Gemini reply whose first candidate carries `text`.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// A Gemini error envelope.
pub fn gemini_error(status: u16, message: &str) -> Value {
    json!({ "error": { "code": status, "message": message, "status": "ERROR" } })
}

pub fn analyze_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and return status, headers and the JSON body.
pub async fn send(app: &mut axum::Router, request: Request<Body>) -> (Response<()>, Value) {
    let response = app.call(request).await.unwrap();
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (Response::from_parts(parts, ()), json)
}
