#![allow(dead_code)]

use ask_service::config::DEFAULT_TEXT_MODEL;
use ask_service::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use ask_service::startup::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";

/// Upstream path for the default model.
pub fn generate_content_path() -> String {
    format!("/models/{}:generateContent", DEFAULT_TEXT_MODEL)
}

/// Gemini provider pointed at a mock upstream.
pub fn gemini_provider(api_base: &str, api_key: Option<&str>) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: api_key.map(|k| Secret::new(k.to_string())),
        model: DEFAULT_TEXT_MODEL.to_string(),
        api_base: api_base.to_string(),
        timeout: Some(Duration::from_secs(5)),
    })
}

/// Keyed Gemini provider with a custom request timeout.
pub fn gemini_provider_with_timeout(api_base: &str, timeout: Duration) -> GeminiTextProvider {
    GeminiTextProvider::new(GeminiConfig {
        api_key: Some(Secret::new(TEST_API_KEY.to_string())),
        model: DEFAULT_TEXT_MODEL.to_string(),
        api_base: api_base.to_string(),
        timeout: Some(timeout),
    })
}

/// Minimal successful `generateContent` body.
pub fn gemini_reply(text: &str) -> Value {
    json!({
        "candidates": [
            {
                "content": { "parts": [ { "text": text } ], "role": "model" },
                "finishReason": "STOP"
            }
        ],
        "usageMetadata": { "promptTokenCount": 1, "candidatesTokenCount": 2 }
    })
}

pub fn router_for(state: &AppState) -> Router {
    build_router(state.clone())
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

pub fn post_raw(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Drive one request through the router and decode the JSON body.
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, request).await;
    let body = serde_json::from_slice(&bytes).expect("response body is not JSON");
    (status, body)
}

pub async fn send_raw(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

/// Poll the status endpoint until the job leaves `pending`.
pub async fn wait_for_job(router: &Router, job_id: &str) -> Value {
    let uri = format!("/ask-gemini/status/{}", job_id);
    for _ in 0..100 {
        let (status, body) = send(router, get(&uri)).await;
        assert_eq!(status, StatusCode::OK, "job {} vanished", job_id);
        if body["status"] != "pending" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("job {} still pending", job_id);
}
