use async_trait::async_trait;
use skillgov_core::{GovError, ModelAdapter, ModelRequest, ModelResponse, Result};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted backend behavior per invocation.
#[derive(Debug, Clone)]
pub enum ScriptStep {
    Text(String),
    Timeout,
    Unavailable,
}

/// Deterministic backend that plays back a queued script, one step per
/// `invoke`. Drives every broker test and the governance-disabled demo run.
pub struct ScriptedModel {
    name: String,
    script: Mutex<VecDeque<ScriptStep>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptStep::Text(text.into()));
        self
    }

    pub fn with_timeout(self) -> Self {
        self.script.lock().unwrap().push_back(ScriptStep::Timeout);
        self
    }

    pub fn with_unavailable(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptStep::Unavailable);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelAdapter for ScriptedModel {
    fn backend_id(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, _req: ModelRequest) -> Result<ModelResponse> {
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(ScriptStep::Text(text)) => Ok(ModelResponse::new(text, self.name.clone())),
            Some(ScriptStep::Timeout) => Err(GovError::BackendTimeout(0)),
            Some(ScriptStep::Unavailable) | None => Err(GovError::BackendUnavailable(
                "script exhausted".to_string(),
            )),
        }
    }
}
