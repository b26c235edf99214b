use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Adapter over a probabilistic text backend. Implemented externally;
/// the broker treats every invocation as independent.
///
/// Implementations must either return text or fail with
/// [`GovError::BackendTimeout`] / [`GovError::BackendUnavailable`], both of
/// which the broker folds into parse-retry accounting.
///
/// [`GovError::BackendTimeout`]: crate::GovError::BackendTimeout
/// [`GovError::BackendUnavailable`]: crate::GovError::BackendUnavailable
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    fn backend_id(&self) -> &str;
    async fn invoke(&self, req: ModelRequest) -> Result<ModelResponse>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    /// JSON schema of the expected structured output, rendered into the
    /// prompt and enforced by the parser.
    pub schema: serde_json::Value,
    /// Explicit seed; deterministic backends must honor it.
    pub seed: u64,
}

impl ModelRequest {
    pub fn new(prompt: impl Into<String>, schema: serde_json::Value, seed: u64) -> Self {
        Self {
            prompt: prompt.into(),
            schema,
            seed,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub usage: Option<ModelUsage>,
    pub backend_id: String,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>, backend_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            backend_id: backend_id.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_request_creation() {
        let req = ModelRequest::new("decide", serde_json::json!({"type": "object"}), 7);
        assert_eq!(req.seed, 7);
        assert_eq!(req.schema["type"], "object");
    }

    #[test]
    fn test_model_response_roundtrip() {
        let resp = ModelResponse::new("{\"skill_id\": \"do_nothing\"}", "scripted");
        let encoded = serde_json::to_string(&resp).unwrap();
        let decoded: ModelResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.text, resp.text);
        assert_eq!(decoded.backend_id, "scripted");
    }
}
