//! Gemini adapter tests against a mock generateContent endpoint.

use base64::Engine;
use restyle::{GeminiAdapter, InputImage, ProviderAdapter, TransformRequest};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.0-flash-preview-image-generation";
const ENDPOINT: &str = "/v1beta/models/gemini-2.0-flash-preview-image-generation:generateContent";

fn request(style: &str) -> TransformRequest {
    TransformRequest::new(
        InputImage::new(vec![1, 2, 3], "image/jpeg"),
        style,
        "test-gemini-key",
        MODEL,
    )
}

fn adapter(server: &MockServer) -> GeminiAdapter {
    GeminiAdapter::builder().base_url(server.uri()).build()
}

#[tokio::test]
async fn test_inline_image_becomes_blob() {
    let mock_server = MockServer::start().await;
    let output = b"generated image bytes".to_vec();
    let encoded = base64::engine::general_purpose::STANDARD.encode(&output);

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(query_param("key", "test-gemini-key"))
        .and(body_partial_json(json!({
            "contents": [{
                "parts": [
                    { "text": "Transform this image into a watercolor painting with soft washes and gentle color bleeding. Show the texture of watercolor paper." },
                    { "inline_data": { "mime_type": "image/jpeg", "data": "AQID" } }
                ]
            }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your watercolor." },
                        { "inline_data": { "mime_type": "image/webp", "data": encoded } }
                    ]
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("watercolor"))
        .await;

    let image = result.into_result().unwrap();
    let blob = image.as_blob().expect("blob");
    assert_eq!(blob.data, output);
    assert_eq!(blob.mime_type, "image/webp");
}

#[tokio::test]
async fn test_key_sent_as_query_not_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "AQID" } }] }
            }]
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;
    assert!(result.is_success());

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert!(req.headers.get("authorization").is_none());
    assert!(req.headers.get("x-goog-api-key").is_none());
    assert_eq!(req.url.query(), Some("key=test-gemini-key"));
}

#[tokio::test]
async fn test_no_inline_data_is_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I cannot edit this image." }] }
            }]
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    let message = result.failure_message().expect("failure");
    assert!(message.contains("No image data"));
    assert!(message.contains("may not have generated an image"));
}

#[tokio::test]
async fn test_missing_content_parts_is_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    assert_eq!(
        result.failure_message(),
        Some("No content parts received from API")
    );
}

#[tokio::test]
async fn test_invalid_key_has_distinct_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.ErrorInfo",
                    "reason": "API_KEY_INVALID"
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    let message = result.failure_message().expect("failure");
    assert!(message.contains("Gemini API key is invalid"));
}

#[tokio::test]
async fn test_invalid_key_reason_without_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "details": [{ "reason": "API_KEY_INVALID" }] }
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    assert!(result
        .failure_message()
        .unwrap()
        .contains("Gemini API key is invalid"));
}

#[tokio::test]
async fn test_null_candidates_is_missing_parts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": null,
            "promptFeedback": { "blockReason": "OTHER" }
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    assert_eq!(
        result.failure_message(),
        Some("No content parts received from API")
    );
}

#[tokio::test]
async fn test_invalid_key_reason_as_bare_error_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "API_KEY_INVALID"
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    assert!(result
        .failure_message()
        .unwrap()
        .contains("Gemini API key is invalid"));
}

#[tokio::test]
async fn test_error_code_400_is_invalid_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "Request contains an invalid argument.",
                "status": "INVALID_ARGUMENT"
            }
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    assert!(result
        .failure_message()
        .unwrap()
        .contains("Gemini API key is invalid"));
}

#[tokio::test]
async fn test_generic_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    let message = result.failure_message().unwrap();
    assert_eq!(message, "Resource has been exhausted (e.g. check quota).");
    assert!(!message.contains("API key is invalid"));
}

#[tokio::test]
async fn test_non_json_error_is_truncated() {
    let mock_server = MockServer::start().await;
    let body = format!("<html><body>{}</body></html>", "gateway ".repeat(50));

    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(502).set_body_string(body.clone()))
        .mount(&mock_server)
        .await;

    let result = adapter(&mock_server)
        .transform_image(&request("anime"))
        .await;

    let message = result.failure_message().unwrap();
    assert_eq!(message, format!("Server error: 502 - {}", &body[..100]));
}
