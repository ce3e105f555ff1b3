use anyhow::Result;
use async_trait::async_trait;

/// One system + user prompt pair sent to a hosted language model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A hosted language model. Construct once at startup and share it between
/// the router and every analyzer.
///
/// Callers treat it as best effort: an `Err` sends them down the
/// deterministic fallback path.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short identifier for logs ("anthropic", "ollama", ...).
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
