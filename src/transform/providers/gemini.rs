//! Gemini (Google) multimodal image provider.

use crate::error::{truncate_preview, RestyleError, Result, PREVIEW_CHARS};
use crate::transform::provider::{ProviderAdapter, ProviderKind};
use crate::transform::providers::status_text;
use crate::transform::style::StylePromptTable;
use crate::transform::types::{ImageBlob, ImageReference, TransformRequest, TransformResult};
use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OUTPUT_MIME_TYPE: &str = "image/png";

const INVALID_KEY_MESSAGE: &str =
    "Your Gemini API key is invalid. Please check your API key and try again.";
const INVALID_KEY_REASON: &str = "API_KEY_INVALID";
const NO_CONTENT_PARTS: &str = "No content parts received from API";
const NO_GENERATED_IMAGE: &str =
    "No image data received from API. The model may not have generated an image.";

/// Prompts sent with the input image, keyed by style token.
pub const GEMINI_PROMPTS: StylePromptTable = StylePromptTable::new(
    &[
        ("simpsons", "Transform this image into the distinctive Simpsons animation style with yellow skin, simple line art, and the characteristic Simpsons aesthetic. Make it look exactly like a Simpsons character."),
        ("studio-ghibli", "Transform this image into the beautiful Studio Ghibli animation style with soft colors, detailed backgrounds, and the magical Ghibli aesthetic. Use the distinctive Studio Ghibli art style."),
        ("family-guy", "Transform this image into the Family Guy animation style with the distinctive art style and character design. Make it look like a Family Guy character."),
        ("disney", "Transform this image into classic Disney animation style with vibrant colors and the timeless Disney aesthetic. Use the classic Disney cartoon style."),
        ("anime", "Transform this image into anime art style with large expressive eyes and detailed anime features. Make it look like an anime character."),
        ("comic-book", "Transform this image into comic book art style with bold lines, vibrant colors, and superhero comic aesthetic. Use a comic book illustration style."),
        ("south-park", "Transform this image into South Park animation style with the simple, cut-out paper aesthetic. Make it look like a South Park character."),
        ("artistic", "Transform this image into an artistic portrait with expressive brushwork and a refined composition. Keep the subject's key features recognizable."),
        ("digital-art", "Transform this image into polished digital art with crisp edges and dramatic lighting. Use a modern digital illustration style."),
        ("oil-painting", "Transform this image into a classical oil painting with visible brush strokes and rich, layered colors. Make it look like a museum canvas."),
        ("watercolor", "Transform this image into a watercolor painting with soft washes and gentle color bleeding. Show the texture of watercolor paper."),
        ("sketch", "Transform this image into a detailed pencil sketch with graphite shading. Use only hand-drawn pencil lines."),
        ("pop-art", "Transform this image into pop art with bold flat colors, halftone dots, and thick black outlines. Use a classic pop art poster style."),
        ("abstract", "Transform this image into an abstract artwork built from shapes and color fields. Keep the overall subject recognizable."),
    ],
    "simpsons",
);

/// Builder for GeminiAdapter.
#[derive(Debug, Clone, Default)]
pub struct GeminiAdapterBuilder {
    client: Option<reqwest::Client>,
    base_url: Option<String>,
}

impl GeminiAdapterBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares an existing HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the API origin (default `https://generativelanguage.googleapis.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the adapter.
    pub fn build(self) -> GeminiAdapter {
        GeminiAdapter {
            client: self.client.unwrap_or_default(),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Gemini image generation adapter.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl Default for GeminiAdapter {
    fn default() -> Self {
        GeminiAdapterBuilder::new().build()
    }
}

impl GeminiAdapter {
    /// Creates a new `GeminiAdapterBuilder`.
    pub fn builder() -> GeminiAdapterBuilder {
        GeminiAdapterBuilder::new()
    }

    async fn transform_impl(&self, request: &TransformRequest) -> Result<ImageReference> {
        let prompt = GEMINI_PROMPTS.prompt_for(&request.style);
        let body = GeminiRequest::new(prompt, request);

        // The key is sent as a query parameter; never log the full URL.
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );

        tracing::debug!(
            url = %url,
            prompt = %truncate_preview(prompt, PREVIEW_CHARS),
            image_kb = request.image.size() / 1024,
            mime_type = %request.image.mime_type,
            "sending Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", request.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RestyleError::Network(e.without_url()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Gemini response received");

        let text = response
            .text()
            .await
            .map_err(|e| RestyleError::Network(e.without_url()))?;
        if !status.is_success() {
            return Err(parse_error(status, &text));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&text)?;
        image_from_response(gemini_response)
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    async fn transform_image(&self, request: &TransformRequest) -> TransformResult {
        match self.transform_impl(request).await {
            Ok(image) => TransformResult::Success { image },
            Err(e) => {
                tracing::warn!(provider = "gemini", error = %e, "image transformation failed");
                e.into()
            }
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }
}

/// Decodes the first inline image part of the first candidate.
fn image_from_response(response: GeminiResponse) -> Result<ImageReference> {
    let parts = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .ok_or_else(|| RestyleError::UnexpectedResponse(NO_CONTENT_PARTS.into()))?;

    let text_parts = parts.iter().filter(|p| p.text.is_some()).count();

    let inline_data = parts
        .into_iter()
        .find_map(|p| p.inline_data)
        .ok_or_else(|| RestyleError::UnexpectedResponse(NO_GENERATED_IMAGE.into()))?;

    let encoded = inline_data
        .data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| RestyleError::UnexpectedResponse(NO_GENERATED_IMAGE.into()))?;

    let mime_type = inline_data
        .mime_type
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT_MIME_TYPE.to_string());

    tracing::debug!(
        mime_type = %mime_type,
        data_kb = encoded.len() / 1024,
        text_parts,
        "found image data in Gemini response"
    );

    let data = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| RestyleError::Decode(e.to_string()))?;

    Ok(ImageReference::Blob(ImageBlob::new(data, mime_type)))
}

fn parse_error(status: reqwest::StatusCode, text: &str) -> RestyleError {
    if text.contains(INVALID_KEY_REASON) {
        return RestyleError::Auth(INVALID_KEY_MESSAGE.into());
    }

    let value = match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => value,
        Err(_) => {
            return RestyleError::Api {
                status: status.as_u16(),
                message: format!(
                    "Server error: {} - {}",
                    status.as_u16(),
                    truncate_preview(text, PREVIEW_CHARS)
                ),
            };
        }
    };

    // JSON of an unexpected shape still counts as a JSON error body.
    let error = serde_json::from_value::<GeminiErrorResponse>(value)
        .ok()
        .and_then(|body| body.error);

    if error.as_ref().is_some_and(is_invalid_key) {
        return RestyleError::Auth(INVALID_KEY_MESSAGE.into());
    }

    let message = error
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed: {}", status_text(status)));

    RestyleError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Gemini reports a rejected key as a 400 whose body names `API_KEY_INVALID`.
fn is_invalid_key(error: &GeminiError) -> bool {
    let message = error.message.as_deref().unwrap_or_default();
    message.contains("API key not valid")
        || message.contains(INVALID_KEY_REASON)
        || error.code == Some(400)
}

// Request/Response types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn new(prompt: &str, req: &TransformRequest) -> Self {
        let parts = vec![
            GeminiRequestPart::Text {
                text: prompt.to_string(),
            },
            GeminiRequestPart::InlineData {
                inline_data: GeminiInlineData {
                    mime_type: req.image.mime_type.clone(),
                    data: base64::engine::general_purpose::STANDARD.encode(&req.image.data),
                },
            },
        ];

        Self {
            contents: vec![GeminiContent { parts }],
            generation_config: GeminiConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Option<Vec<GeminiPartResponse>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default, alias = "inlineData")]
    inline_data: Option<InlineData>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    #[serde(default, alias = "mimeType")]
    mime_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    #[serde(default)]
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::providers::openai::OPENAI_PROMPTS;
    use crate::transform::types::InputImage;

    fn sample_request() -> TransformRequest {
        let png = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        TransformRequest::new(
            InputImage::from_bytes(png),
            "anime",
            "test-key",
            "gemini-2.0-flash-preview-image-generation",
        )
    }

    #[test]
    fn test_unknown_style_uses_default_prompt() {
        assert_eq!(
            GEMINI_PROMPTS.prompt_for("no-such-style"),
            GEMINI_PROMPTS.prompt_for("simpsons")
        );
    }

    #[test]
    fn test_prompt_wording_differs_from_openai() {
        assert_ne!(
            GEMINI_PROMPTS.prompt_for("anime"),
            OPENAI_PROMPTS.prompt_for("anime")
        );
    }

    #[test]
    fn test_request_serialization() {
        let req = sample_request();
        let body = GeminiRequest::new(GEMINI_PROMPTS.prompt_for(&req.style), &req);
        let json = serde_json::to_value(&body).unwrap();

        let parts = &json["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("anime"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "iVBORw0KGgoAAAAA");
        assert_eq!(
            json["generationConfig"]["responseModalities"],
            serde_json::json!(["TEXT", "IMAGE"])
        );
        assert!(json.get("generation_config").is_none());
    }

    #[test]
    fn test_response_snake_case_inline_data() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here you go"},
                        {"inline_data": {"mime_type": "image/jpeg", "data": "AQID"}}
                    ]
                }
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = image_from_response(resp).unwrap();
        let blob = image.as_blob().unwrap();
        assert_eq!(blob.data, vec![1, 2, 3]);
        assert_eq!(blob.mime_type, "image/jpeg");
    }

    #[test]
    fn test_response_camel_case_inline_data() {
        let json = r#"{
            "candidates": [{
                "content": {"parts": [{"inlineData": {"mimeType": "image/webp", "data": "AQID"}}]},
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = image_from_response(resp).unwrap();
        assert_eq!(image.as_blob().unwrap().mime_type, "image/webp");
    }

    #[test]
    fn test_response_missing_mime_type_defaults_to_png() {
        let json = r#"{"candidates": [{"content": {"parts": [{"inline_data": {"data": "AQID"}}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let image = image_from_response(resp).unwrap();
        assert_eq!(image.as_blob().unwrap().mime_type, "image/png");
    }

    #[test]
    fn test_response_without_parts() {
        for json in [
            r#"{}"#,
            r#"{"candidates": null}"#,
            r#"{"candidates": [{}]}"#,
            r#"{"candidates": [{"content": {}}]}"#,
        ] {
            let resp: GeminiResponse = serde_json::from_str(json).unwrap();
            let err = image_from_response(resp).unwrap_err();
            assert_eq!(err.user_message(), NO_CONTENT_PARTS);
        }
    }

    #[test]
    fn test_response_text_only() {
        let json = r#"{"candidates": [{"content": {"parts": [{"text": "I can't do that"}]}}]}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        let err = image_from_response(resp).unwrap_err();
        assert_eq!(err.user_message(), NO_GENERATED_IMAGE);
    }

    #[test]
    fn test_parse_error_invalid_key() {
        let body = r#"{
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"reason": "API_KEY_INVALID"}]
            }
        }"#;
        let err = parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, RestyleError::Auth(_)));
        assert_eq!(err.user_message(), INVALID_KEY_MESSAGE);
    }

    #[test]
    fn test_parse_error_invalid_key_reason_in_any_shape() {
        for body in [r#"{"error": "API_KEY_INVALID"}"#, "API_KEY_INVALID"] {
            let err = parse_error(reqwest::StatusCode::BAD_REQUEST, body);
            assert!(matches!(err, RestyleError::Auth(_)), "body: {body}");
        }
    }

    #[test]
    fn test_parse_error_code_400_is_invalid_key() {
        let body = r#"{"error": {"code": 400, "message": "Request contains an invalid argument."}}"#;
        let err = parse_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.user_message(), INVALID_KEY_MESSAGE);
    }

    #[test]
    fn test_parse_error_unexpected_json_shape() {
        let err = parse_error(reqwest::StatusCode::FORBIDDEN, r#"{"error": "denied"}"#);
        assert_eq!(err.user_message(), "API request failed: Forbidden");
    }

    #[test]
    fn test_parse_error_json_message() {
        let body = r#"{"error": {"code": 429, "message": "Resource has been exhausted"}}"#;
        let err = parse_error(reqwest::StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(err.user_message(), "Resource has been exhausted");
    }

    #[test]
    fn test_parse_error_json_without_message() {
        let err = parse_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, r#"{}"#);
        assert_eq!(
            err.user_message(),
            "API request failed: Service Unavailable"
        );
    }

    #[test]
    fn test_parse_error_non_json_is_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(300));
        let err = parse_error(reqwest::StatusCode::BAD_GATEWAY, &body);
        let message = err.user_message();
        assert!(message.starts_with("Server error: 502 - <html>"));
        assert_eq!(message.len(), "Server error: 502 - ".len() + PREVIEW_CHARS);
    }
}
