//! Gemini provider tests
//!
//! Run the provider against a mock Gemini endpoint

use dorex_gateway::models::{GenerationConfig, GenerationRequest, Modality, MediaPart, Part};
use dorex_gateway::providers::{GeminiProvider, Provider, ProviderError};
use dorex_gateway::services::Credential;
use httpmock::prelude::*;
use serde_json::json;

const PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn provider(server: &MockServer) -> GeminiProvider {
    GeminiProvider::with_timeout(&server.base_url(), 5).expect("Failed to create provider")
}

fn request() -> GenerationRequest {
    GenerationRequest::new("gemini-2.0-flash", vec![Part::text("say hello")])
}

fn credential() -> Credential {
    Credential::new("AIzaPooledKey0001", 0)
}

fn error_body(code: u16, status: &str, message: &str) -> serde_json::Value {
    json!({"error": {"code": code, "message": message, "status": status}})
}

#[tokio::test]
async fn test_text_response_and_auth_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path(PATH)
                .header("x-goog-api-key", "AIzaPooledKey0001")
                .body_contains("say hello");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "hel"}, {"text": "lo"}]},
                    "finishReason": "STOP"
                }]
            }));
        })
        .await;

    let result = provider(&server).generate(&request(), &credential()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.text.as_deref(), Some("hello"));
    assert!(result.media.is_none());
}

#[tokio::test]
async fn test_image_response_becomes_data_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/models/image-model:generateContent")
                .body_contains("inlineData")
                .body_contains("responseModalities");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"text": "Here is your image"},
                        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
                    ]}
                }]
            }));
        })
        .await;

    let photo = MediaPart::from_data_url("data:image/jpeg;base64,/9j/4AAQ").unwrap();
    let request = GenerationRequest::new("image-model", vec![Part::media(photo), Part::text("remove the background")])
        .with_config(GenerationConfig::default().with_modalities(&[Modality::Text, Modality::Image]));

    let result = provider(&server).generate(&request, &credential()).await.unwrap();

    let media = result.media.unwrap();
    assert_eq!(media.content_type, "image/png");
    assert_eq!(media.url, "data:image/png;base64,iVBORw0KGgo=");
}

#[tokio::test]
async fn test_structured_response_is_parsed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH).body_contains("responseSchema");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "```json\n{\"tags\": [\"rust\", \"axum\"]}\n```"}]}
                }]
            }));
        })
        .await;

    let schema = json!({"type": "OBJECT", "properties": {"tags": {"type": "ARRAY"}}});
    let request = request().with_config(GenerationConfig::default().with_schema(schema));

    let result = provider(&server).generate(&request, &credential()).await.unwrap();

    assert_eq!(result.structured, Some(json!({"tags": ["rust", "axum"]})));
}

#[tokio::test]
async fn test_quota_error_is_rate_limited() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(429)
                .json_body(error_body(429, "RESOURCE_EXHAUSTED", "Quota exceeded for metric"));
        })
        .await;

    let error = provider(&server).generate(&request(), &credential()).await.unwrap_err();

    assert_eq!(error, ProviderError::RateLimited("Quota exceeded for metric".to_string()));
    assert!(error.is_rate_limited());
}

#[tokio::test]
async fn test_bad_request_is_invalid_input() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(400)
                .json_body(error_body(400, "INVALID_ARGUMENT", "Unsupported MIME type"));
        })
        .await;

    let error = provider(&server).generate(&request(), &credential()).await.unwrap_err();

    assert!(matches!(error, ProviderError::InvalidInput(msg) if msg == "Unsupported MIME type"));
}

#[tokio::test]
async fn test_server_error_without_envelope_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(503).body("upstream overloaded");
        })
        .await;

    let error = provider(&server).generate(&request(), &credential()).await.unwrap_err();

    match error {
        ProviderError::ProviderUnavailable(msg) => assert!(msg.contains("upstream overloaded")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_blocked_prompt_is_invalid_input() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            }));
        })
        .await;

    let error = provider(&server).generate(&request(), &credential()).await.unwrap_err();

    assert_eq!(error, ProviderError::InvalidInput("Prompt blocked: SAFETY".to_string()));
}

#[tokio::test]
async fn test_unreachable_host_is_unavailable() {
    // Nothing listens on port 9 locally
    let provider = GeminiProvider::with_timeout("http://127.0.0.1:9", 2).unwrap();

    let error = provider.generate(&request(), &credential()).await.unwrap_err();

    assert!(matches!(error, ProviderError::ProviderUnavailable(_)));
}

#[test]
fn test_error_classification_table() {
    assert!(ProviderError::classify(429, "", "x").is_rate_limited());
    assert!(ProviderError::classify(403, "RESOURCE_EXHAUSTED", "x").is_rate_limited());
    assert!(matches!(ProviderError::classify(404, "NOT_FOUND", "x"), ProviderError::InvalidInput(_)));
    assert!(matches!(ProviderError::classify(500, "INTERNAL", "x"), ProviderError::ProviderUnavailable(_)));
    assert!(matches!(ProviderError::classify(403, "PERMISSION_DENIED", "x"), ProviderError::Unknown(_)));
}
