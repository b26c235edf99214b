use async_trait::async_trait;
use serde_json::json;
use skillgov_core::{ModelAdapter, ModelRequest, ModelResponse, Result};

/// Emits the same well-formed proposal on every invocation. Useful as a
/// stand-in backend for smoke runs: appraisal labels are left empty, so the
/// coherence check sees an all-midpoint tuple.
pub struct ConstantModel {
    skill_id: String,
    confidence: f64,
}

impl ConstantModel {
    pub fn new(skill_id: impl Into<String>) -> Self {
        Self {
            skill_id: skill_id.into(),
            confidence: 0.5,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

#[async_trait]
impl ModelAdapter for ConstantModel {
    fn backend_id(&self) -> &str {
        "constant"
    }

    async fn invoke(&self, _req: ModelRequest) -> Result<ModelResponse> {
        let text = json!({
            "reasoning_labels": {},
            "skill_id": self.skill_id,
            "confidence": self.confidence,
        })
        .to_string();
        Ok(ModelResponse::new(text, "constant"))
    }
}
