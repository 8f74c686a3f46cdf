//! Mock provider implementation for testing.

use super::{ProviderError, TextProvider};
use crate::models::Generation;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
enum MockOutcome {
    Reply(String),
    Fail(String),
    Unconfigured,
    Panic,
}

/// Mock text provider for testing.
///
/// Replies with a fixed outcome. A gated mock parks every call until the
/// gate is notified, which lets tests observe jobs while they are pending.
pub struct MockTextProvider {
    outcome: MockOutcome,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl MockTextProvider {
    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeed with `text`, wrapped in a Gemini-shaped envelope.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Reply(text.into()))
    }

    /// Fail with an upstream API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_outcome(MockOutcome::Fail(message.into()))
    }

    /// Behave like a provider without a credential.
    pub fn unconfigured() -> Self {
        Self::with_outcome(MockOutcome::Unconfigured)
    }

    /// Panic inside `generate`.
    pub fn panicking() -> Self {
        Self::with_outcome(MockOutcome::Panic)
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.outcome {
            MockOutcome::Reply(text) => Ok(Generation {
                text: text.clone(),
                raw: json!({
                    "candidates": [ { "content": { "parts": [ { "text": text } ], "role": "model" } } ],
                    "modelVersion": "mock",
                    "promptLength": prompt.len(),
                }),
            }),
            MockOutcome::Fail(message) => Err(ProviderError::ApiError {
                status: 500,
                message: message.clone(),
            }),
            MockOutcome::Unconfigured => Err(ProviderError::NotConfigured(
                "Mock text provider not configured".to_string(),
            )),
            MockOutcome::Panic => panic!("mock provider panicked"),
        }
    }

    fn is_configured(&self) -> bool {
        !matches!(self.outcome, MockOutcome::Unconfigured)
    }
}
