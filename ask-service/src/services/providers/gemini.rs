//! Gemini AI provider implementation.
//!
//! Calls the `generateContent` REST method and pulls plain text out of the
//! response envelope.

use super::{GenerationOptions, ProviderError, TextProvider};
use crate::models::Generation;
use async_trait::async_trait;
use metrics::{counter, histogram};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
    pub timeout: Option<Duration>,
}

/// Gemini text provider.
pub struct GeminiTextProvider {
    config: GeminiConfig,
    client: Option<Client>,
}

impl GeminiTextProvider {
    pub fn new(config: GeminiConfig) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let client = match builder.build() {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create HTTP client, Gemini calls will fail");
                None
            }
        };

        Self { config, client }
    }

    /// Use a caller-supplied transport; `None` models an unavailable one.
    pub fn with_client(config: GeminiConfig, client: Option<Client>) -> Self {
        Self { config, client }
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn call(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured(
                "Gemini API key is not configured (GEMINI_API_KEY)".to_string(),
            )
        })?;
        let client = self.client.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("HTTP client is not available".to_string())
        })?;

        let request = build_request(prompt, &GenerationOptions::service_defaults());

        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = client
            .post(self.api_url())
            .query(&[("key", api_key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            // The URL carries the key; keep it out of messages.
            .map_err(|e| {
                ProviderError::NetworkError(format!("Gemini request failed: {}", e.without_url()))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: format!("Gemini API Error: {} - {}", status.as_u16(), error_text),
            });
        }

        let raw: Value = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!(
                "Failed to parse Gemini response: {}",
                e.without_url()
            ))
        })?;

        let text = extract_text(&raw).unwrap_or_default();

        Ok(Generation { text, raw })
    }
}

#[async_trait]
impl TextProvider for GeminiTextProvider {
    async fn generate(&self, prompt: &str) -> Result<Generation, ProviderError> {
        let started = Instant::now();
        let result = self.call(prompt).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        counter!("gemini_requests_total", "outcome" => outcome).increment(1);
        histogram!("gemini_request_duration_seconds").record(started.elapsed().as_secs_f64());

        if let Err(e) = &result {
            tracing::warn!(
                model = %self.config.model,
                kind = e.kind(),
                error = %e,
                "Gemini request failed"
            );
        }

        result
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }
}

/// Build the `generateContent` body: one content block holding the prompt as
/// its only part, plus `generationConfig` when any option is set.
pub fn build_request(prompt: &str, options: &GenerationOptions) -> GenerateContentRequest {
    let generation_config = GenerationConfig {
        temperature: options.temperature,
        candidate_count: options.candidate_count,
    };

    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: (!generation_config.is_empty()).then_some(generation_config),
    }
}

/// Pull the generated text out of a `generateContent` response.
///
/// Never fails. Only the first candidate is read. Its parts come from
/// `content.parts`, or from `content` itself when that is an array, and their
/// `text` fields are joined. A missing or falsy text counts as empty and any
/// other non-string is stringified. With no parts, a string `content` is
/// returned as-is and anything else yields the candidate serialized as JSON. No candidate, or a candidate without
/// content, gives `None`.
pub fn extract_text(body: &Value) -> Option<String> {
    let candidate = body.get("candidates")?.as_array()?.first()?;
    if !candidate.is_object() {
        return None;
    }

    let content = Candidate::deserialize(candidate).ok()?.content?;

    let parts = match content {
        CandidateContent::Text(text) if text.is_empty() => return None,
        CandidateContent::Text(text) => return Some(text),
        CandidateContent::Parts(parts) => parts,
        CandidateContent::Structured {
            parts: Some(PartList::Parts(parts)),
        } => parts,
        CandidateContent::Structured { .. } => Vec::new(),
        CandidateContent::Other(value) if is_falsy(&value) => return None,
        CandidateContent::Other(_) => Vec::new(),
    };

    if parts.is_empty() {
        return Some(candidate.to_string());
    }

    Some(parts.into_iter().map(PartEntry::into_text).collect())
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<u32>,
}

impl GenerationConfig {
    fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.candidate_count.is_none()
    }
}

// The response side is deliberately lenient: every shape the upstream has
// been seen to send maps onto some variant, so decoding a candidate object
// cannot fail.

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidateContent {
    Text(String),
    Parts(Vec<PartEntry>),
    Structured {
        #[serde(default)]
        parts: Option<PartList>,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PartList {
    Parts(Vec<PartEntry>),
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PartEntry {
    Fields(Map<String, Value>),
    Other(IgnoredAny),
}

impl PartEntry {
    /// A falsy or missing `text` is empty; other non-strings are rendered
    /// the way JavaScript string conversion would.
    fn into_text(self) -> String {
        match self {
            PartEntry::Fields(mut fields) => match fields.remove("text") {
                Some(text) if !is_falsy(&text) => to_js_string(&text),
                _ => String::new(),
            },
            PartEntry::Other(_) => String::new(),
        }
    }
}

fn to_js_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => f.to_string(),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(to_js_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}
