pub mod gemini_provider;
pub mod llm_factory;
pub mod llm_provider;
pub mod narrative;
pub mod openai_compatible_provider;
pub mod prompt;

pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use llm_factory::LLMProviderFactory;
pub use llm_provider::*;
pub use narrative::NarrativeRequester;
pub use openai_compatible_provider::{OpenAICompatibleConfig, OpenAICompatibleProvider};
pub use prompt::{PromptError, PromptTemplate, FUEL_CELL_ANALYSIS_TEMPLATE};
