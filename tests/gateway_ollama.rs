//! Wire behavior of the Ollama gateway against a mock HTTP server.

#![cfg(feature = "ollama")]

use httpmock::prelude::*;
use serde_json::json;

use convograph::gateway::{GatewayError, ModelGateway, OllamaGateway};
use convograph::message::Turn;

#[tokio::test]
async fn list_models_parses_tag_names() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({
                "models": [
                    {"name": "llama3.1", "size": 123},
                    {"name": "qwen2", "size": 456},
                ]
            }));
        })
        .await;

    let gateway = OllamaGateway::new(server.base_url());
    let models = gateway.list_models().await.unwrap();

    mock.assert_async().await;
    assert_eq!(models, vec!["llama3.1".to_string(), "qwen2".to_string()]);
}

#[tokio::test]
async fn list_models_tolerates_an_empty_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).json_body(json!({}));
        })
        .await;

    let gateway = OllamaGateway::new(server.base_url());
    assert!(gateway.list_models().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_success_status_maps_to_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(500);
        })
        .await;

    let gateway = OllamaGateway::new(server.base_url());
    let err = gateway.list_models().await.unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable { .. }));
}

#[tokio::test]
async fn invoke_posts_the_turn_sequence_and_returns_the_content() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .json_body_partial(r#"{"model": "llama3.1", "stream": false}"#);
            then.status(200).json_body(json!({
                "message": {"role": "assistant", "content": "Hello back."},
                "done": true
            }));
        })
        .await;

    let gateway = OllamaGateway::new(server.base_url());
    let turns = vec![Turn::user("earlier"), Turn::assistant("ok"), Turn::user("hello")];
    let reply = gateway.invoke("llama3.1", &turns).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.text, "Hello back.");
}

#[tokio::test]
async fn reply_without_content_maps_to_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200).json_body(json!({"done": true}));
        })
        .await;

    let gateway = OllamaGateway::new(server.base_url());
    let err = gateway.invoke("m", &[Turn::user("q")]).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
}

#[tokio::test]
async fn unreachable_server_maps_to_unavailable() {
    // Nothing listens on the discard port.
    let gateway = OllamaGateway::new("http://127.0.0.1:9");
    let err = gateway.invoke("m", &[Turn::user("q")]).await.unwrap_err();
    assert!(matches!(err, GatewayError::Unavailable { .. }));
}
