use crate::prediction_client::{HttpPredictionClient, PredictionClient};
use crate::store::{InMemoryPredictionStore, PredictionStore};
use fuelcell_ai::{GenerationConfig, LLMProvider, LLMProviderFactory, NarrativeRequester};
use fuelcell_core::{
    ContextBuilder, FuelCellConfig, PreviewExtractor, ReportSegmenter, Result,
};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FuelCellConfig>,
    pub context_builder: ContextBuilder,
    pub segmenter: ReportSegmenter,
    pub preview: PreviewExtractor,
    /// `None` when no generation provider could be configured.
    pub narrator: Option<Arc<NarrativeRequester>>,
    pub predictions: Arc<dyn PredictionClient>,
    pub store: Arc<dyn PredictionStore>,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    ///
    /// A provider that cannot be built (missing API key, unknown provider) only
    /// disables the narrative path; the numeric endpoints keep working.
    pub fn new(config: FuelCellConfig) -> Result<Self> {
        let predictions: Arc<dyn PredictionClient> =
            Arc::new(HttpPredictionClient::new(&config.prediction)?);
        let store: Arc<dyn PredictionStore> = Arc::new(InMemoryPredictionStore::new());

        let provider = match LLMProviderFactory::create_from_config(&config.llm) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!(
                    provider = %config.llm.provider,
                    error = %e,
                    "Narrative generation disabled"
                );
                None
            }
        };

        let mut state = Self::with_collaborators(config, predictions, store);
        if let Some(provider) = provider {
            state = state.with_provider(provider);
        }
        Ok(state)
    }

    pub fn with_collaborators(
        config: FuelCellConfig,
        predictions: Arc<dyn PredictionClient>,
        store: Arc<dyn PredictionStore>,
    ) -> Self {
        Self {
            context_builder: ContextBuilder::new(config.stack.clone()),
            segmenter: ReportSegmenter::new(),
            preview: PreviewExtractor::new(config.display.preview_chars),
            narrator: None,
            predictions,
            store,
            config: Arc::new(config),
        }
    }

    /// Route narratives through `provider` using the configured generation parameters.
    pub fn with_provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        let requester = NarrativeRequester::new(provider)
            .with_generation_config(GenerationConfig::from(&self.config.llm));
        self.narrator = Some(Arc::new(requester));
        self
    }

    pub fn narrative_enabled(&self) -> bool {
        self.narrator.is_some()
    }
}
