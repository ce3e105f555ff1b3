use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use intake_core::agent::{CompletionRequest, ModelBackend};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Calls a locally-hosted Ollama model via its native chat API.
///
/// For offices where client facts must not leave the local machine.
pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }

    pub fn build_request(&self, request: &CompletionRequest) -> OllamaChatRequest {
        let mut messages = Vec::new();
        if !request.system.is_empty() {
            messages.push(OllamaMessage {
                role: "system".into(),
                content: request.system.clone(),
            });
        }
        messages.push(OllamaMessage {
            role: "user".into(),
            content: request.user.clone(),
        });
        OllamaChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OllamaMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<OllamaMessage>,
    pub stream: bool,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

pub fn parse_response(body: &str) -> Result<String> {
    let parsed: OllamaChatResponse =
        serde_json::from_str(body).context("invalid ollama chat response")?;
    Ok(parsed.message.content)
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let request_body = self.build_request(request);

        info!(
            model = %self.model,
            base_url = %self.base_url,
            "calling ollama chat API"
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let response = match client.post(self.chat_url()).json(&request_body).send().await {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(timeout_secs = self.timeout_secs, "ollama request timed out");
                bail!("ollama request timed out after {}s", self.timeout_secs);
            }
            Err(e) => {
                warn!("ollama request failed: {}", e);
                return Err(e).context("ollama request failed");
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "ollama returned non-200: {}", body);
            bail!("ollama error {status}: {body}");
        }

        let body = response.text().await.context("failed to read ollama response")?;
        let output = parse_response(&body).inspect_err(|e| {
            warn!("failed to parse ollama response: {e:#}");
        })?;

        info!(output_len = output.len(), "ollama response received");
        Ok(output)
    }
}
