pub mod anthropic;
pub mod ollama;

use std::sync::Arc;

use intake_core::agent::ModelBackend;
use intake_core::config::{BackendKind, Config};
use tracing::info;

pub use anthropic::AnthropicBackend;
pub use ollama::OllamaBackend;

/// Build the configured backend once at startup. `None` means every analysis
/// runs on rules alone.
pub fn select_backend(config: &Config) -> Option<Arc<dyn ModelBackend>> {
    let backend: Option<Arc<dyn ModelBackend>> = match config.effective_backend() {
        BackendKind::Anthropic => Some(Arc::new(
            AnthropicBackend::new(&config.anthropic_api_key, &config.model)
                .with_base_url(&config.anthropic_base_url)
                .with_max_tokens(config.llm_max_tokens)
                .with_timeout(config.llm_timeout_s),
        )),
        BackendKind::Ollama => Some(Arc::new(
            OllamaBackend::new(&config.ollama_url, &config.ollama_model)
                .with_timeout(config.llm_timeout_s),
        )),
        BackendKind::Auto | BackendKind::None => None,
    };
    match &backend {
        Some(b) => info!(backend = b.name(), "model backend enabled"),
        None => info!("no model backend configured, analyses are rule-based"),
    }
    backend
}
