//! Chat provider abstraction and implementations.
//!
//! The analyzer treats the model as a black-box single-turn call:
//! [`ChatProvider::chat`] takes a prompt and returns the reply text. The
//! concrete backend is selected from `[ai]` config.
//!
//! # Retry Strategy
//!
//! The OpenAI provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::AiConfig;

/// Trait for chat providers.
///
/// A provider performs one prompt → text completion per call. Failures are
/// surfaced as errors; the analyzer isolates them per factor-kind group.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Identity string (`provider/model`) mixed into the config fingerprint.
    fn identity(&self) -> &str;

    /// Send a single-turn prompt and return the raw reply text.
    async fn chat(&self, prompt: &str) -> Result<String>;
}

/// Create the configured provider, or `None` when `[ai]` is disabled.
///
/// A missing provider is an informational condition, not an error: callers
/// report "no provider configured" and skip analysis.
pub fn create_provider(config: &AiConfig) -> Result<Option<Box<dyn ChatProvider>>> {
    match config.provider.as_str() {
        "disabled" => Ok(None),
        "openai" => Ok(Some(Box::new(OpenAiChatProvider::new(config)?))),
        other => bail!("Unknown AI provider: {}", other),
    }
}

// ============ OpenAI-compatible Provider ============

/// Chat provider for the OpenAI chat-completions API (and compatible
/// servers via `api_base`).
///
/// Requires the `OPENAI_API_KEY` environment variable. Temperature is kept
/// low so repeated audits of the same content score consistently.
pub struct OpenAiChatProvider {
    identity: String,
    model: String,
    api_base: String,
    temperature: f64,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAiChatProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ai.model required for OpenAI provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self {
            identity: config.identity(),
            model,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            temperature: config.temperature,
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatProvider {
    fn identity(&self) -> &str {
        &self.identity
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Chat API error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Chat call failed after retries")))
    }
}

/// Extract the first choice's message content from a chat-completions
/// response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat response: missing choices[0].message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "{\"seo_clarity\": 0.42}" } }
            ]
        });
        assert_eq!(
            parse_chat_response(&json).unwrap(),
            "{\"seo_clarity\": 0.42}"
        );
    }

    #[test]
    fn test_parse_chat_response_missing_content() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_chat_response(&json).is_err());
    }
}
