use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use intake_core::agent::{CompletionRequest, ModelBackend};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Calls the Anthropic Messages API with a single system + user turn.
pub struct AnthropicBackend {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl AnthropicBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".into(),
            model: model.into(),
            max_tokens: 2048,
            timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    pub fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.user,
            }],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub system: &'a str,
    pub messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: String,
}

/// Concatenate the text blocks of a Messages API reply.
pub fn parse_response(body: &str) -> Result<String> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).context("invalid Messages API response")?;
    Ok(parsed
        .content
        .into_iter()
        .filter(|b| b.kind == "text")
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join(""))
}

/// Best-effort error message from a non-2xx body.
pub fn parse_error(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(e) if !e.error.message.is_empty() => format!("{}: {}", e.error.kind, e.error.message),
        _ => body.chars().take(200).collect(),
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.build_request(request);
        let url = self.messages_url();

        info!(
            model = %self.model,
            prompt_len = request.user.len(),
            "calling anthropic messages API"
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let response = match client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => {
                warn!(timeout_secs = self.timeout_secs, "anthropic request timed out");
                bail!("anthropic request timed out after {}s", self.timeout_secs);
            }
            Err(e) => {
                warn!("anthropic request failed: {}", e);
                return Err(e).context("anthropic request failed");
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .context("failed to read anthropic response body")?;
        if !status.is_success() {
            let detail = parse_error(&text);
            warn!(status = %status, "anthropic returned non-200: {}", detail);
            bail!("anthropic error {status}: {detail}");
        }

        let output = parse_response(&text).inspect_err(|e| {
            warn!("failed to parse anthropic response: {e:#}");
        })?;

        info!(output_len = output.len(), "anthropic response received");
        Ok(output)
    }
}
