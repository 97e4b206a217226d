use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for the Google Gemini provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key for Google AI Studio
    pub api_key: String,
    /// Model to use (e.g., "gemini-2.5-flash")
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Connection establishment timeout in seconds; the overall deadline is the caller's
    pub connect_timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GOOGLE_API_KEY").unwrap_or_default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Google Gemini LLM provider
pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!(
                "Google API key is required. Set GOOGLE_API_KEY environment variable."
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::default())
    }

    /// Single request to the generateContent endpoint
    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<GeminiResponse> {
        let request = GeminiRequest {
            contents: messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(|m| GeminiContent {
                    role: Some(match m.role {
                        MessageRole::Assistant => "model".to_string(),
                        _ => "user".to_string(),
                    }),
                    parts: vec![GeminiPart {
                        text: Some(m.content.clone()),
                    }],
                })
                .collect(),
            system_instruction: messages
                .iter()
                .find(|m| m.role == MessageRole::System)
                .map(|m| GeminiContent {
                    role: None,
                    parts: vec![GeminiPart {
                        text: Some(m.content.clone()),
                    }],
                }),
            generation_config: GeminiGenerationConfig {
                temperature: Some(config.temperature),
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
                stop_sequences: config.stop.clone(),
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Gemini API")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        response
            .json::<GeminiResponse>()
            .await
            .context("Failed to parse Gemini API response")
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let start = Instant::now();
        let response = self.send_request(messages, config).await?;

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Gemini API returned no candidates"))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = content.len(),
            "Gemini generation finished"
        );

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LLMResponse {
            content,
            total_tokens: usage.total_token_count,
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
            finish_reason: candidate.finish_reason,
            model: response
                .model_version
                .unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// Gemini API request/response types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: Option<usize>,
    #[serde(default)]
    candidates_token_count: Option<usize>,
    #[serde(default)]
    total_token_count: Option<usize>,
}
