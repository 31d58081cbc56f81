//! OpenAI image edits provider (gpt-image-1, dall-e-3, dall-e-2).

use crate::error::{truncate_preview, RestyleError, Result, PREVIEW_CHARS};
use crate::transform::provider::{ProviderAdapter, ProviderKind};
use crate::transform::providers::{status_text, NO_IMAGE_DATA};
use crate::transform::style::StylePromptTable;
use crate::transform::types::{ImageBlob, ImageReference, TransformRequest, TransformResult};
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const EDITS_PATH: &str = "/v1/images/edits";
const OUTPUT_SIZE: &str = "1024x1024";
const OUTPUT_MIME_TYPE: &str = "image/png";

/// Prompts sent to the edits endpoint, keyed by style token.
pub const OPENAI_PROMPTS: StylePromptTable = StylePromptTable::new(
    &[
        ("simpsons", "Transform this image into the distinctive Simpsons animation style with yellow skin, simple line art, and the characteristic Simpsons aesthetic"),
        ("studio-ghibli", "Transform this image into the beautiful Studio Ghibli animation style with soft colors, detailed backgrounds, and the magical Ghibli aesthetic"),
        ("family-guy", "Transform this image into the Family Guy animation style with the distinctive art style and character design"),
        ("disney", "Transform this image into classic Disney animation style with vibrant colors and the timeless Disney aesthetic"),
        ("anime", "Transform this image into anime art style with large expressive eyes and detailed anime features"),
        ("comic-book", "Transform this image into comic book art style with bold lines, vibrant colors, and superhero comic aesthetic"),
        ("south-park", "Transform this image into South Park animation style with the simple, cut-out paper aesthetic"),
        ("artistic", "Transform this image into an artistic portrait with expressive brushwork and a refined, gallery-style composition"),
        ("digital-art", "Transform this image into polished digital art with crisp edges, rich lighting, and a modern illustration look"),
        ("oil-painting", "Transform this image into a classical oil painting with visible brush strokes and deep, layered colors"),
        ("watercolor", "Transform this image into a watercolor painting with soft washes, bleeding edges, and paper texture"),
        ("sketch", "Transform this image into a pencil sketch with graphite shading and fine hand-drawn lines"),
        ("pop-art", "Transform this image into pop art with bold flat colors, halftone dots, and thick outlines"),
        ("abstract", "Transform this image into an abstract composition of shapes and color that keeps the subject recognizable"),
    ],
    "simpsons",
);

/// Builder for OpenAiAdapter.
#[derive(Debug, Clone, Default)]
pub struct OpenAiAdapterBuilder {
    client: Option<reqwest::Client>,
    base_url: Option<String>,
}

impl OpenAiAdapterBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares an existing HTTP client.
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the API origin (default `https://api.openai.com`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Builds the adapter.
    pub fn build(self) -> OpenAiAdapter {
        OpenAiAdapter {
            client: self.client.unwrap_or_default(),
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// OpenAI image edits adapter.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl Default for OpenAiAdapter {
    fn default() -> Self {
        OpenAiAdapterBuilder::new().build()
    }
}

impl OpenAiAdapter {
    /// Creates a new `OpenAiAdapterBuilder`.
    pub fn builder() -> OpenAiAdapterBuilder {
        OpenAiAdapterBuilder::new()
    }

    async fn transform_impl(&self, request: &TransformRequest) -> Result<ImageReference> {
        let prompt = OPENAI_PROMPTS.prompt_for(&request.style);

        let ext = request
            .image
            .format()
            .map(|f| f.extension())
            .unwrap_or("png");

        let image_part = reqwest::multipart::Part::bytes(request.image.data.clone())
            .file_name(format!("image.{}", ext))
            .mime_str(&request.image.mime_type)
            .map_err(|e| RestyleError::InvalidRequest(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .text("prompt", prompt)
            .text("model", request.model.clone())
            .text("n", "1")
            .text("size", OUTPUT_SIZE);

        tracing::debug!(
            model = %request.model,
            style = %request.style,
            prompt = %truncate_preview(prompt, PREVIEW_CHARS),
            image_kb = request.image.size() / 1024,
            mime_type = %request.image.mime_type,
            "sending OpenAI image edit request"
        );

        let response = self
            .client
            .post(format!("{}{}", self.base_url, EDITS_PATH))
            .header("Authorization", format!("Bearer {}", request.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "OpenAI response received");

        let text = response.text().await?;
        if !status.is_success() {
            return Err(parse_error(status, &text));
        }

        let body: OpenAiImageResponse = serde_json::from_str(&text)?;
        image_from_response(body)
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    async fn transform_image(&self, request: &TransformRequest) -> TransformResult {
        match self.transform_impl(request).await {
            Ok(image) => TransformResult::Success { image },
            Err(e) => {
                tracing::warn!(provider = "openai", error = %e, "image transformation failed");
                e.into()
            }
        }
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }
}

/// Picks the inline base64 payload if present, else the remote URL.
fn image_from_response(body: OpenAiImageResponse) -> Result<ImageReference> {
    let image_data = body
        .data
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| RestyleError::UnexpectedResponse(NO_IMAGE_DATA.into()))?;

    if let Some(b64) = image_data.b64_json.filter(|s| !s.is_empty()) {
        let data = base64::engine::general_purpose::STANDARD
            .decode(b64.trim())
            .map_err(|e| RestyleError::Decode(e.to_string()))?;
        return Ok(ImageReference::Blob(ImageBlob::new(data, OUTPUT_MIME_TYPE)));
    }

    if let Some(url) = image_data.url.filter(|s| !s.is_empty()) {
        return Ok(ImageReference::Url(url));
    }

    Err(RestyleError::UnexpectedResponse(NO_IMAGE_DATA.into()))
}

fn parse_error(status: reqwest::StatusCode, text: &str) -> RestyleError {
    let message = serde_json::from_str::<OpenAiErrorResponse>(text)
        .ok()
        .and_then(|body| body.error)
        .and_then(|error| error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API request failed: {}", status_text(status)));

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return RestyleError::Auth(message);
    }
    RestyleError::Api {
        status: status.as_u16(),
        message,
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Option<Vec<OpenAiImageData>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    #[serde(default)]
    error: Option<OpenAiError>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    #[serde(default)]
    message: Option<String>,
}
