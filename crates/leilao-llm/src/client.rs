//! Chat-completion client for OpenAI-compatible providers (DeepSeek).
//!
//! The pipeline only needs one capability from a language model: turn a
//! prompt into text. [`CompletionClient`] captures exactly that, and
//! [`ChatClient`] implements it over the chat-completions wire format with
//! retry on transient errors and typed quota failures.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::LlmError;
use crate::retry::retry_with_backoff;

/// A single text-completion capability.
///
/// Implementations own transport and authentication; callers own prompt
/// construction and response parsing.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one system+user prompt pair and returns the model's text.
    ///
    /// # Errors
    ///
    /// See [`LlmError`].
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions response envelope.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Chat-completions HTTP client.
///
/// Points at a full endpoint URL (e.g.
/// `https://api.deepseek.com/v1/chat/completions`); tests point it at a
/// wiremock server instead. Requests JSON-object output mode so the
/// generated listings come back machine-parseable.
pub struct ChatClient {
    client: Client,
    api_key: String,
    model: String,
    api_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl ChatClient {
    /// Creates a client for the given endpoint, key, and model.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_url: api_url.into(),
            max_retries,
            backoff_base_ms,
        })
    }

    async fn send_once(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();

        // 402 is DeepSeek's insufficient-balance status; 429 is the usual
        // too-many-requests. Both mean the quota is gone for this run.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::PAYMENT_REQUIRED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::QuotaExceeded(format!(
                "HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }

        // Convert remaining non-2xx into reqwest's status error so the retry
        // layer can distinguish 5xx (transient) from 4xx.
        let response = response.error_for_status()?;

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: "chat completions response".to_owned(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ApiError("response contained no choices".to_owned()))?;

        Ok(content)
    }
}

#[async_trait]
impl CompletionClient for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async {
            self.send_once(system, user).await
        })
        .await
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
