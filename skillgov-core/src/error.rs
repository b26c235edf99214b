#[derive(Debug, thiserror::Error)]
pub enum GovError {
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Memory error: {0}")]
    Memory(String),

    #[error("Audit error: {0}")]
    Audit(String),

    #[error("Model backend timed out after {0} ms")]
    BackendTimeout(u64),

    #[error("Model backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GovError>;

impl GovError {
    /// Backend failures count against the parse-retry budget rather than
    /// aborting the decision.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            GovError::BackendTimeout(_) | GovError::BackendUnavailable(_)
        )
    }
}
