use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use fuelcell_ai::{
    GeminiConfig, GeminiProvider, GenerationConfig, LLMProvider, Message, OpenAICompatibleConfig,
    OpenAICompatibleProvider,
};
use serde_json::{json, Value};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn gemini_generate(
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"message": "API key not valid"}})),
        );
    }
    assert_eq!(action, "gemini-test:generateContent");
    assert_eq!(body["generationConfig"]["topP"].as_f64().map(|v| (v * 10.0).round()), Some(8.0));

    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "## Summary\n"}, {"text": prompt}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 3, "candidatesTokenCount": 5, "totalTokenCount": 8}
        })),
    )
}

#[tokio::test]
async fn gemini_provider_joins_candidate_parts() {
    let base = serve(Router::new().route("/models/{action}", post(gemini_generate))).await;
    let provider = GeminiProvider::new(GeminiConfig {
        api_key: "test-key".to_string(),
        model: "gemini-test".to_string(),
        base_url: base,
        connect_timeout_secs: 5,
    })
    .unwrap();

    let response = provider
        .generate_chat(&[Message::user("echo me")], &GenerationConfig::default())
        .await
        .unwrap();

    assert_eq!(response.content, "## Summary\necho me");
    assert_eq!(response.total_tokens, Some(8));
    assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
}

#[tokio::test]
async fn gemini_provider_surfaces_upstream_status() {
    let base = serve(Router::new().route("/models/{action}", post(gemini_generate))).await;
    let provider = GeminiProvider::new(GeminiConfig {
        api_key: "wrong-key".to_string(),
        model: "gemini-test".to_string(),
        base_url: base,
        connect_timeout_secs: 5,
    })
    .unwrap();

    let err = provider.generate("hello").await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("403"));
    assert!(message.contains("API key not valid"));
}

#[tokio::test]
async fn gemini_provider_rejects_empty_candidates() {
    let router = Router::new().route(
        "/models/{action}",
        post(|| async { Json(json!({"candidates": []})) }),
    );
    let base = serve(router).await;
    let provider = GeminiProvider::new(GeminiConfig {
        api_key: "k".to_string(),
        model: "gemini-test".to_string(),
        base_url: base,
        connect_timeout_secs: 5,
    })
    .unwrap();

    let err = provider.generate("hello").await.unwrap_err();
    assert!(err.to_string().contains("no candidates"));
}

#[tokio::test]
async fn openai_compatible_provider_reads_first_choice() {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(
                headers.get("authorization").and_then(|v| v.to_str().ok()),
                Some("Bearer local-key")
            );
            assert_eq!(body["messages"][0]["role"], "user");
            Json(json!({
                "model": "local",
                "choices": [{"message": {"role": "assistant", "content": "### Summary\nlocal"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 2, "total_tokens": 3}
            }))
        }),
    );
    let base = serve(router).await;
    let provider = OpenAICompatibleProvider::new(OpenAICompatibleConfig {
        base_url: format!("{}/v1", base),
        model: "local".to_string(),
        api_key: Some("local-key".to_string()),
        ..Default::default()
    })
    .unwrap();

    let response = provider.generate("hi").await.unwrap();
    assert_eq!(response.content, "### Summary\nlocal");
    assert_eq!(response.completion_tokens, Some(2));
}
