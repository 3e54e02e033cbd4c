//! OpenAIModel against an in-process mock of the chat completions endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use orderscan_core::{GenerateTextParams, LanguageModel, ModelConfig, OrderScanError};
use orderscan_provider_openai::OpenAIModel;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

type Seen = Arc<Mutex<Vec<Value>>>;

async fn start_mock(status: StatusCode, body: Value) -> (String, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let state = (seen.clone(), status, body);

    let app = Router::new()
        .route(
            "/chat/completions",
            post(
                |State((seen, status, body)): State<(Seen, StatusCode, Value)>,
                 Json(request): Json<Value>| async move {
                    seen.lock().unwrap().push(request);
                    (status, Json(body))
                },
            ),
        )
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), seen)
}

fn config_for(base: &str) -> ModelConfig {
    let mut config = ModelConfig::new("sk-test");
    config.api_base = Some(base.to_string());
    config.timeout_secs = 10;
    config
}

#[tokio::test]
async fn test_completion_text_is_returned() {
    let (base, seen) = start_mock(
        StatusCode::OK,
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "ORDER_NUMBER: 4711" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        }),
    )
    .await;

    let model = OpenAIModel::new(&config_for(&base)).unwrap();
    let text = model
        .generate_text(GenerateTextParams::prompt("Extract the order number"))
        .await
        .unwrap();

    assert_eq!(text, "ORDER_NUMBER: 4711");

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "gpt-3.5-turbo");
    assert_eq!(requests[0]["temperature"], 0.0);
    assert_eq!(requests[0]["messages"][0]["role"], "user");
    assert_eq!(requests[0]["messages"][0]["content"], "Extract the order number");
    assert!(requests[0].get("stream").map_or(true, |s| s == false));
}

#[tokio::test]
async fn test_params_override_configured_model() {
    let (base, seen) = start_mock(
        StatusCode::OK,
        json!({
            "id": "chatcmpl-2",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "ok" },
                "finish_reason": "stop"
            }]
        }),
    )
    .await;

    let model = OpenAIModel::new(&config_for(&base)).unwrap();
    let params = GenerateTextParams {
        prompt: "hi".to_string(),
        model: Some("gpt-4o-mini".to_string()),
        max_tokens: Some(64),
        temperature: None,
    };
    model.generate_text(params).await.unwrap();

    let requests = seen.lock().unwrap().clone();
    assert_eq!(requests[0]["model"], "gpt-4o-mini");
    assert_eq!(requests[0]["max_tokens"], 64);
}

#[tokio::test]
async fn test_auth_failure_maps_to_model_error() {
    let (base, _seen) = start_mock(
        StatusCode::UNAUTHORIZED,
        json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "param": null,
                "code": "invalid_api_key"
            }
        }),
    )
    .await;

    let model = OpenAIModel::new(&config_for(&base)).unwrap();
    let err = model
        .generate_text(GenerateTextParams::prompt("anything"))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderScanError::Model(_)));
    assert!(err.to_string().contains("Incorrect API key provided"));
}
