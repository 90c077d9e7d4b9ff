mod common;

use std::time::Duration;

use aquarium_analyser::analysis::{AnalysisKind, VisionModel};
use aquarium_analyser::article::rewrite::ArticleRewriter;
use aquarium_analyser::config::Config;
use aquarium_analyser::error::AppError;
use aquarium_analyser::openai::OpenAiClient;
use axum::{
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};

fn client_for(base_url: &url::Url, timeout: Duration) -> OpenAiClient {
    let config = Config {
        openai_api_key: Some("test-key".to_string()),
        openai_base_url: base_url.as_str().trim_end_matches('/').to_string(),
        model_timeout: timeout,
        ..Config::default()
    };
    OpenAiClient::new(&config).unwrap()
}

fn completion(content: &str) -> Value {
    json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
}

/// Echoes request details back inside a fenced JSON answer.
async fn echo_completion(headers: HeaderMap, Json(request): Json<Value>) -> Json<Value> {
    let answer = json!({
        "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
        "model": request["model"],
        "response_format": request["response_format"]["type"],
        "image_url": request["messages"][1]["content"][1]["image_url"]["url"],
    });
    Json(completion(&format!("```json\n{}\n```", answer)))
}

#[tokio::test]
async fn vision_request_carries_key_image_and_json_mode() {
    let base = common::serve(Router::new().route("/chat/completions", post(echo_completion))).await;
    let client = client_for(&base, Duration::from_secs(5));

    let value = client
        .analyze_image(AnalysisKind::Algae, "image/png", "AAAA")
        .await
        .unwrap();

    assert_eq!(value["authorization"], "Bearer test-key");
    assert_eq!(value["model"], "gpt-4o");
    assert_eq!(value["response_format"], "json_object");
    assert_eq!(value["image_url"], "data:image/png;base64,AAAA");
}

#[tokio::test]
async fn rewrite_strips_code_fences() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(completion("```html\n<article><h1>Reworded</h1></article>\n```")) }),
    );
    let base = common::serve(router).await;
    let client = client_for(&base, Duration::from_secs(5));

    let html = client.rewrite("<article><h1>Original</h1></article>").await.unwrap();
    assert_eq!(html, "<article><h1>Reworded</h1></article>");
}

#[tokio::test]
async fn error_status_becomes_model_error() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
    );
    let base = common::serve(router).await;
    let client = client_for(&base, Duration::from_secs(5));

    let err = client.rewrite("<p>x</p>").await.unwrap_err();
    match err {
        AppError::ModelError(msg) => assert!(msg.contains("429")),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn empty_choices_become_model_error() {
    let router = Router::new().route("/chat/completions", post(|| async { Json(json!({ "choices": [] })) }));
    let base = common::serve(router).await;
    let client = client_for(&base, Duration::from_secs(5));

    let err = client
        .analyze_image(AnalysisKind::FishHealth, "image/jpeg", "AAAA")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ModelError(_)));
}

#[tokio::test]
async fn slow_model_times_out() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(completion("{}"))
        }),
    );
    let base = common::serve(router).await;
    let client = client_for(&base, Duration::from_millis(200));

    let started = std::time::Instant::now();
    let err = client.rewrite("<p>x</p>").await.unwrap_err();
    assert!(matches!(err, AppError::ModelError(_)));
    assert!(started.elapsed() < Duration::from_secs(4));
}
