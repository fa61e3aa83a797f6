use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion backend not configured")]
    NotConfigured,
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("Malformed completion response: {0}")]
    Malformed(String),
}

/// Natural-language completion collaborator. Every failure is treated by the
/// parser the same way: use the deterministic fallback.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[async_trait]
impl<T: CompletionBackend + ?Sized> CompletionBackend for Box<T> {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        (**self).complete(prompt).await
    }
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Replies with a preset string, or fails every call.
pub struct MockCompletion {
    reply: Option<String>,
}

impl MockCompletion {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: Some(reply.into()) }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        self.reply.clone().ok_or(CompletionError::NotConfigured)
    }
}

// ── OpenAI-compatible chat completions ────────────────────────────────────────

pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 150;

#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ChatCompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COMPLETION_URL.to_string(),
            api_key: None,
            model: DEFAULT_COMPLETION_MODEL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletion {
    client: reqwest::Client,
    config: ChatCompletionConfig,
}

impl ChatCompletion {
    pub fn new(config: ChatCompletionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(CompletionError::NotConfigured);
        };

        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage { role: "user", content: prompt }],
            max_tokens: MAX_TOKENS,
        };

        let response: ChatResponse = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Malformed("no choices in response".into()))
    }
}
