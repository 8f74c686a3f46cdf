//! Runs with the production panic hook installed. A panic that escapes
//! containment exits this test binary with status 1.

mod common;

use ask_service::services::providers::mock::MockTextProvider;
use ask_service::startup::AppState;
use axum::http::StatusCode;
use common::{get, post_json, router_for, send, wait_for_job};
use serde_json::json;
use service_core::observability::install_panic_hook;
use std::sync::Arc;

#[tokio::test]
async fn job_panic_does_not_exit_the_process() {
    install_panic_hook();
    let router = router_for(&AppState::new(Arc::new(MockTextProvider::panicking())));

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (status, body) = send(
            &router,
            post_json("/ask-gemini", &json!({ "prompt": "hello", "async": true })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        ids.push(body["jobId"].as_str().unwrap().to_string());
    }

    for id in &ids {
        let job = wait_for_job(&router, id).await;
        assert_eq!(job["status"], "failed");
        assert!(job["error"]
            .as_str()
            .unwrap()
            .starts_with("Job aborted unexpectedly: mock provider panicked"));
    }

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
