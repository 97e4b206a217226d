use crate::gemini_provider::{GeminiConfig, GeminiProvider};
use crate::llm_provider::*;
use crate::openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
use anyhow::{anyhow, Result};
use fuelcell_core::{LLMConfig, SUPPORTED_LLM_PROVIDERS};
use std::sync::Arc;
use tracing::info;

/// Factory for creating LLM providers based on configuration
pub struct LLMProviderFactory;

impl LLMProviderFactory {
    /// Create an LLM provider from configuration
    pub fn create_from_config(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let provider_name = config.provider.to_lowercase();

        let provider = match provider_name.as_str() {
            "gemini" => Self::create_gemini_provider(config)?,
            "openai-compatible" => Self::create_openai_compatible_provider(config)?,
            _ => {
                return Err(anyhow!(
                    "Unsupported LLM provider: {}. Available providers: {}",
                    provider_name,
                    SUPPORTED_LLM_PROVIDERS.join(", ")
                ))
            }
        };

        info!(
            provider = provider.provider_name(),
            model = provider.model_name(),
            "Narrative provider ready"
        );
        Ok(provider)
    }

    /// Create a Google Gemini provider
    fn create_gemini_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let api_key = config
            .google_api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
            .ok_or_else(|| {
                anyhow!(
                    "Google API key not found. Set 'google_api_key' in config \
                     or GOOGLE_API_KEY environment variable"
                )
            })?;

        let mut gemini_config = GeminiConfig {
            api_key,
            model: config.model.clone(),
            ..Default::default()
        };
        if let Some(base_url) = &config.base_url {
            gemini_config.base_url = base_url.clone();
        }

        Ok(Arc::new(GeminiProvider::new(gemini_config)?))
    }

    /// Create an OpenAI-compatible provider
    fn create_openai_compatible_provider(config: &LLMConfig) -> Result<Arc<dyn LLMProvider>> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            anyhow!("OpenAI-compatible base URL not found. Set 'llm.base_url' in config")
        })?;

        let compat_config = OpenAICompatibleConfig {
            base_url,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            ..Default::default()
        };

        Ok(Arc::new(OpenAICompatibleProvider::new(compat_config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_creation() {
        let config = LLMConfig {
            google_api_key: Some("test-key".to_string()),
            ..Default::default()
        };

        let provider = LLMProviderFactory::create_from_config(&config).unwrap();
        assert_eq!(provider.provider_name(), "gemini");
        assert_eq!(provider.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn test_openai_compatible_requires_base_url() {
        let config = LLMConfig {
            provider: "openai-compatible".to_string(),
            base_url: None,
            ..Default::default()
        };

        let result = LLMProviderFactory::create_from_config(&config);
        assert!(result.is_err());

        let config = LLMConfig {
            provider: "openai-compatible".to_string(),
            base_url: Some("http://localhost:1234/v1".to_string()),
            model: "qwen2.5".to_string(),
            ..Default::default()
        };
        let provider = LLMProviderFactory::create_from_config(&config).unwrap();
        assert_eq!(provider.model_name(), "qwen2.5");
    }

    #[test]
    fn test_unknown_provider() {
        let config = LLMConfig {
            provider: "telepathy".to_string(),
            ..Default::default()
        };

        let result = LLMProviderFactory::create_from_config(&config);
        assert!(result
            .err()
            .map(|e| e.to_string().contains("Unsupported LLM provider"))
            .unwrap_or(false));
    }
}
