use anyhow::anyhow;
use async_trait::async_trait;
use fuelcell_ai::{
    GenerationConfig, LLMProvider, LLMResponse, LLMResult, Message, NarrativeRequester,
    PromptTemplate,
};
use fuelcell_core::{AnalysisRequest, ContextBuilder, FuelCellError, StackConfiguration};
use std::sync::{Arc, Mutex};

enum Behaviour {
    Reply(&'static str),
    Fail(&'static str),
}

struct ScriptedProvider {
    behaviour: Behaviour,
    prompts: Mutex<Vec<String>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            prompts: Mutex::new(Vec::new()),
            calls: Mutex::new(0),
        })
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        *self.calls.lock().unwrap() += 1;
        self.prompts
            .lock()
            .unwrap()
            .extend(messages.iter().map(|m| m.content.clone()));

        match self.behaviour {
            Behaviour::Reply(text) => Ok(LLMResponse {
                content: text.to_string(),
                total_tokens: Some(42),
                prompt_tokens: None,
                completion_tokens: None,
                finish_reason: Some("STOP".to_string()),
                model: "scripted".to_string(),
            }),
            Behaviour::Fail(message) => Err(anyhow!(message)),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

fn context(humidity: bool) -> fuelcell_core::AnalysisContext {
    let request = AnalysisRequest {
        currents: vec![0.0, 100.0, 200.0],
        voltages: vec![480.0, 300.0, 260.0],
        powers: vec![0.0, 30000.0, 52000.0],
        model_type: "svr".to_string(),
        temperature: 65.0,
        hydrogen: 1.5,
        oxygen: 2.0,
        rh_cathode: humidity.then_some(85.0),
        rh_anode: humidity.then_some(90.0),
    };
    let curve = request.curve().unwrap();
    ContextBuilder::new(StackConfiguration::default()).build(
        &curve,
        &curve.analyze(),
        &request.operating_context(),
    )
}

#[tokio::test]
async fn returns_generated_text_from_a_single_call() {
    let provider = ScriptedProvider::new(Behaviour::Reply("## Summary\nAll good."));
    let requester = NarrativeRequester::new(provider.clone());

    let text = requester.request(&context(true)).await.unwrap();
    assert_eq!(text, "## Summary\nAll good.");
    assert_eq!(*provider.calls.lock().unwrap(), 1);

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("400 cells connected in series"));
    assert!(prompt.contains("Power Output: 52000.00 W"));
    assert!(prompt.contains("Avg. Cell Voltage at MPP:** 0.650 V"));
    assert!(prompt.contains("Cathode RH: 85%"));
    assert!(prompt.contains("Recommendation: Ensure membrane stays hydrated"));
    assert!(!prompt.contains('{'));
}

#[tokio::test]
async fn prompt_without_humidity_uses_placeholder_text() {
    let provider = ScriptedProvider::new(Behaviour::Reply("text"));
    let requester = NarrativeRequester::new(provider.clone());

    let prompt = requester.render_prompt(&context(false)).unwrap();
    assert!(prompt.contains("Humidity data not provided"));
    assert!(prompt.contains("- Not applicable for this model type."));
}

#[tokio::test]
async fn failures_are_wrapped_as_upstream_errors_without_retry() {
    let provider = ScriptedProvider::new(Behaviour::Fail("quota exceeded"));
    let requester = NarrativeRequester::new(provider.clone());

    let err = requester.request(&context(true)).await.unwrap_err();
    match err {
        FuelCellError::UpstreamService(message) => assert!(message.contains("quota exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(*provider.calls.lock().unwrap(), 1);
}

#[tokio::test]
async fn empty_response_is_an_upstream_error() {
    let provider = ScriptedProvider::new(Behaviour::Reply("   "));
    let requester = NarrativeRequester::new(provider);

    let err = requester.request(&context(false)).await.unwrap_err();
    assert!(matches!(err, FuelCellError::UpstreamService(_)));
}

#[tokio::test]
async fn custom_template_with_unknown_slot_fails_before_calling_provider() {
    let provider = ScriptedProvider::new(Behaviour::Reply("unused"));
    let requester = NarrativeRequester::new(provider.clone())
        .with_template(PromptTemplate::new("Explain {max_power} and {favourite_colour}"));

    let err = requester.request(&context(false)).await.unwrap_err();
    assert!(matches!(err, FuelCellError::Config(_)));
    assert_eq!(*provider.calls.lock().unwrap(), 0);
}
