//! Single request/response exchange with the text generation service.
//!
//! The requester never retries and imposes no deadline of its own; callers
//! wrap [`NarrativeRequester::request`] in their own timeout.

use crate::llm_provider::{GenerationConfig, LLMProvider, Message};
use crate::prompt::PromptTemplate;
use fuelcell_core::{AnalysisContext, FuelCellError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct NarrativeRequester {
    provider: Arc<dyn LLMProvider>,
    template: PromptTemplate,
    generation: GenerationConfig,
}

impl NarrativeRequester {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            template: PromptTemplate::default(),
            generation: GenerationConfig::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn render_prompt(&self, context: &AnalysisContext) -> Result<String> {
        self.template
            .render(&context.variables())
            .map_err(|e| FuelCellError::Config(format!("prompt template: {}", e)))
    }

    /// Send the rendered prompt and return the generated text.
    pub async fn request(&self, context: &AnalysisContext) -> Result<String> {
        let prompt = self.render_prompt(context)?;
        let start = Instant::now();

        info!(
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            prompt_chars = prompt.len(),
            "Requesting narrative"
        );

        let response = self
            .provider
            .generate_chat(&[Message::user(prompt)], &self.generation)
            .await
            .map_err(|e| {
                error!(
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Narrative generation failed"
                );
                FuelCellError::UpstreamService(format!("{:#}", e))
            })?;

        if response.content.trim().is_empty() {
            error!(
                provider = self.provider.provider_name(),
                finish_reason = ?response.finish_reason,
                "Narrative generation returned no text"
            );
            return Err(FuelCellError::UpstreamService(format!(
                "{} returned an empty response",
                self.provider.provider_name()
            )));
        }

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            chars = response.content.len(),
            tokens = ?response.total_tokens,
            "Narrative generated"
        );

        Ok(response.content)
    }
}
