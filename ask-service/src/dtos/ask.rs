use crate::models::JobStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;

pub const PROMPT_REQUIRED: &str = "Prompt is required and must be a string";

/// Validated body of `POST /ask-gemini`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskRequest {
    pub prompt: String,
    /// Run as a background job instead of waiting for the upstream.
    pub run_async: bool,
}

impl AskRequest {
    /// Parse a raw request body.
    ///
    /// A body that is empty or not JSON is treated like one without a
    /// prompt, so every malformed request gets the same 400.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        let value = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self::from_value(&value)
    }

    /// `prompt` must be a non-empty string. `async` is optional and follows
    /// JSON truthiness: absent, `null`, `false`, `0` and `""` mean synchronous.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        let prompt = value
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|prompt| !prompt.is_empty())
            .ok_or_else(|| AppError::BadRequest(PROMPT_REQUIRED.to_string()))?;

        let run_async = value.get("async").map(is_truthy).unwrap_or(false);

        Ok(Self {
            prompt: prompt.to_string(),
            run_async,
        })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Synchronous success body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    /// Always `"success"`.
    pub status: String,
    pub duration_ms: u64,
    pub text: String,
    pub raw: Value,
}

/// Body of the 202 returned for asynchronous requests.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: String,
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejected(value: Value) -> bool {
        matches!(
            AskRequest::from_value(&value),
            Err(AppError::BadRequest(ref m)) if m == PROMPT_REQUIRED
        )
    }

    #[test]
    fn accepts_plain_prompt_as_synchronous() {
        let request = AskRequest::from_value(&json!({ "prompt": "hello" })).unwrap();
        assert_eq!(request.prompt, "hello");
        assert!(!request.run_async);
    }

    #[test]
    fn rejects_missing_empty_or_non_string_prompt() {
        assert!(rejected(json!({})));
        assert!(rejected(json!({ "prompt": "" })));
        assert!(rejected(json!({ "prompt": 42 })));
        assert!(rejected(json!({ "prompt": ["hello"] })));
        assert!(rejected(json!({ "prompt": null })));
        assert!(rejected(json!("hello")));
        assert!(rejected(Value::Null));
    }

    #[test]
    fn async_flag_follows_json_truthiness() {
        let run_async = |flag: Value| {
            AskRequest::from_value(&json!({ "prompt": "p", "async": flag }))
                .unwrap()
                .run_async
        };

        assert!(run_async(json!(true)));
        assert!(run_async(json!(1)));
        assert!(run_async(json!("yes")));
        assert!(run_async(json!("false")));
        assert!(run_async(json!({})));
        assert!(!run_async(json!(false)));
        assert!(!run_async(json!(0)));
        assert!(!run_async(json!("")));
        assert!(!run_async(Value::Null));
    }

    #[test]
    fn unparseable_body_is_a_missing_prompt() {
        assert!(matches!(
            AskRequest::from_body(b"{not json"),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(AskRequest::from_body(b""), Err(AppError::BadRequest(_))));
        assert!(AskRequest::from_body(br#"{"prompt":"hi","async":true}"#)
            .unwrap()
            .run_async);
    }

    #[test]
    fn accepted_body_uses_camel_case() {
        let body = serde_json::to_value(JobAccepted {
            job_id: "abc".to_string(),
            status: JobStatus::Pending,
        })
        .unwrap();
        assert_eq!(body, json!({ "jobId": "abc", "status": "pending" }));
    }
}
