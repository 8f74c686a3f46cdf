//! AI provider abstractions and implementations.
//!
//! Handlers and the job runner talk to a [`TextProvider`]; the Gemini client
//! is the production implementation and the mock backs the tests.

pub mod gemini;
pub mod mock;

use crate::models::Generation;
use async_trait::async_trait;
use service_core::error::AppError;
use thiserror::Error;

/// Error type for provider operations.
///
/// Display strings are returned to API clients as-is.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing credential or HTTP transport. Raised before any network call.
    #[error("{0}")]
    NotConfigured(String),

    /// The upstream answered with a non-success status.
    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("{0}")]
    NetworkError(String),

    /// The upstream answered 2xx with a body that is not JSON.
    #[error("{0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::NetworkError(_) => "network_error",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Optional sampling parameters. Unset fields are left out of the upstream
/// request entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub candidate_count: Option<u32>,
}

impl GenerationOptions {
    /// Parameters used for every prompt the service forwards.
    pub fn service_defaults() -> Self {
        Self {
            temperature: Some(0.2),
            candidate_count: Some(1),
        }
    }
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Generate text for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError>;

    /// Whether a credential is present. Used for the startup warning only;
    /// `generate` performs its own check.
    fn is_configured(&self) -> bool;
}
