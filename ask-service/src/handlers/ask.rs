use crate::dtos::{AskRequest, AskResponse, JobAccepted};
use crate::models::Job;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use service_core::error::AppError;
use std::time::Instant;

/// `POST /ask-gemini`
///
/// Synchronous requests wait for the upstream and return its text. With
/// `async` set, a pending job is recorded and 202 is returned at once.
pub async fn ask_gemini(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let request = AskRequest::from_body(&body)?;

    if request.run_async {
        let job = state.runner.submit(request.prompt);
        let status = job.status();
        let accepted = JobAccepted {
            job_id: job.id,
            status,
        };
        return Ok((StatusCode::ACCEPTED, Json(accepted)).into_response());
    }

    tracing::info!(prompt_len = request.prompt.len(), "Sync prompt received");
    let start = Instant::now();

    let generation = state.provider.generate(&request.prompt).await.map_err(|e| {
        tracing::error!(error = %e, "Sync request to Gemini failed");
        AppError::from(e)
    })?;

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::info!(duration_ms, "Sync prompt answered");

    Ok(Json(AskResponse {
        status: "success".to_string(),
        duration_ms,
        text: generation.text,
        raw: generation.raw,
    })
    .into_response())
}

/// `GET /ask-gemini/status/:id`
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    state
        .jobs
        .get(&job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))
}
