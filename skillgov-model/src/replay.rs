use async_trait::async_trait;
use skillgov_audit::{AuditRecord, read_records};
use skillgov_core::{GovError, ModelAdapter, ModelRequest, ModelResponse, Result};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// Replays the raw model outputs recorded in an audit trail, attempt by
/// attempt, in write order.
///
/// Driving the broker over the same snapshots and seeds with this adapter
/// reproduces the original run's decisions bit-for-bit.
pub struct ReplayModel {
    outputs: Mutex<VecDeque<String>>,
}

impl ReplayModel {
    pub fn from_records(records: &[AuditRecord]) -> Self {
        let outputs = records
            .iter()
            .flat_map(|r| r.attempts.iter())
            .map(|a| a.raw_output.clone())
            .collect();
        Self {
            outputs: Mutex::new(outputs),
        }
    }

    pub fn from_audit_file(path: impl AsRef<Path>) -> Result<Self> {
        let records = read_records(path)?;
        Ok(Self::from_records(&records))
    }

    pub fn remaining(&self) -> usize {
        self.outputs.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelAdapter for ReplayModel {
    fn backend_id(&self) -> &str {
        "replay"
    }

    async fn invoke(&self, _req: ModelRequest) -> Result<ModelResponse> {
        match self.outputs.lock().unwrap().pop_front() {
            Some(text) => Ok(ModelResponse::new(text, "replay")),
            None => Err(GovError::BackendUnavailable(
                "replay exhausted: more attempts requested than recorded".to_string(),
            )),
        }
    }
}
