use async_trait::async_trait;
use fuelcell_core::LLMConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type LLMResult<T> = anyhow::Result<T>;

/// Sampling parameters sent with every narrative request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: Some(0.8),
            max_output_tokens: None,
            stop: None,
        }
    }
}

impl From<&LLMConfig> for GenerationConfig {
    fn from(config: &LLMConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: Some(config.top_p),
            max_output_tokens: Some(config.max_output_tokens),
            stop: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Generated text plus whatever usage accounting the backend reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub total_tokens: Option<usize>,
    pub prompt_tokens: Option<usize>,
    pub completion_tokens: Option<usize>,
    /// Backend-specific, e.g. "STOP" or "length"
    pub finish_reason: Option<String>,
    pub model: String,
}

/// A text generation backend. Implementations make exactly one HTTP call per
/// request and never retry.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> LLMResult<LLMResponse> {
        self.generate_chat(&[Message::user(prompt)], &GenerationConfig::default())
            .await
    }

    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse>;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;
}
