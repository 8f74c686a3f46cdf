use serde::{Deserialize, Serialize};

/// Text produced by the upstream model together with the envelope it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Concatenated text of the first candidate; empty when none was found.
    pub text: String,

    /// Upstream response body, passed through untouched.
    pub raw: serde_json::Value,
}
