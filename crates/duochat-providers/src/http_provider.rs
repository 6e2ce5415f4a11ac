//! Generic HTTP reply provider for OpenAI-compatible APIs.
//!
//! Defaults to Groq's OpenAI-compatible endpoint; any `/chat/completions`
//! server (OpenAI, OpenRouter, a local vLLM) works via `ai.apiBase`.

use async_trait::async_trait;
use tracing::{debug, error};

use duochat_core::config::schema::AiConfig;

use crate::traits::{error_reply, ReplyProvider};
use crate::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};

/// Groq's OpenAI-compatible base URL.
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";

// ─────────────────────────────────────────────
// HttpProvider
// ─────────────────────────────────────────────

/// A reply provider that talks to any OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.groq.com/openai/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpProvider {
    /// Create a provider from the `ai` config section.
    pub fn new(config: &AiConfig) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| GROQ_API_BASE.to_string());

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_else(|e| {
                error!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        HttpProvider {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl ReplyProvider for HttpProvider {
    async fn reply(&self, prompt: &str) -> String {
        debug!(model = %self.model, prompt_len = prompt.len(), "Calling AI reply");

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![WireMessage::user(prompt)],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let result = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await;

        let response = match result {
            Ok(resp) => resp,
            Err(e) => {
                error!(error = %e, "HTTP request failed");
                return error_reply(e);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %error_text, "API error");
            return error_reply(format!("{} — {}", status, error_text));
        }

        match response.json::<ChatCompletionResponse>().await {
            Ok(chat_resp) => match chat_resp.into_text() {
                Some(text) => {
                    debug!(reply_len = text.len(), "AI reply received");
                    text
                }
                None => error_reply("No choices in response"),
            },
            Err(e) => {
                error!(error = %e, "Failed to parse AI response");
                error_reply(format!("Error parsing response: {}", e))
            }
        }
    }

    fn display_name(&self) -> &str {
        &self.model
    }
}

// ─────────────────────────────────────────────
// Builder (convenience)
// ─────────────────────────────────────────────

/// Build an HttpProvider from the `ai` config section.
///
/// Fails when no API key is configured.
pub fn create_provider(config: &AiConfig) -> Result<HttpProvider, String> {
    if !config.is_configured() {
        return Err(
            "No AI API key configured. Set ai.apiKey in config.json or DUOCHAT_AI__API_KEY."
                .to_string(),
        );
    }

    debug!(
        model = %config.model,
        api_base = config.api_base.as_deref().unwrap_or(GROQ_API_BASE),
        "Creating AI reply provider"
    );

    Ok(HttpProvider::new(config))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
