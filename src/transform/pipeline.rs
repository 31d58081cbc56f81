//! Dispatch from provider kind to adapter.

use crate::settings::Settings;
use crate::transform::provider::{ProviderAdapter, ProviderKind};
use crate::transform::providers::{GeminiAdapter, OpenAiAdapter};
use crate::transform::types::{InputImage, TransformRequest, TransformResult};

/// Returns the adapter for `kind`, sharing `client`.
pub fn adapter_for(kind: ProviderKind, client: reqwest::Client) -> Box<dyn ProviderAdapter> {
    match kind {
        ProviderKind::OpenAi => Box::new(OpenAiAdapter::builder().client(client).build()),
        ProviderKind::Gemini => Box::new(GeminiAdapter::builder().client(client).build()),
    }
}

/// Returns the adapter for a provider name. Unknown names get the Gemini adapter.
pub fn adapter_for_name(name: &str, client: reqwest::Client) -> Box<dyn ProviderAdapter> {
    adapter_for(ProviderKind::from_name(name), client)
}

/// Runs transformations against the selected provider.
///
/// Holds no per-request state; concurrent calls are independent.
#[derive(Debug, Clone)]
pub struct TransformPipeline {
    openai: OpenAiAdapter,
    gemini: GeminiAdapter,
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl TransformPipeline {
    /// Creates a pipeline whose adapters share `client` and use the
    /// providers' public endpoints.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            openai: OpenAiAdapter::builder().client(client.clone()).build(),
            gemini: GeminiAdapter::builder().client(client).build(),
        }
    }

    /// Creates a pipeline from explicitly configured adapters.
    pub fn with_adapters(openai: OpenAiAdapter, gemini: GeminiAdapter) -> Self {
        Self { openai, gemini }
    }

    /// Returns the adapter used for `kind`.
    pub fn adapter(&self, kind: ProviderKind) -> &dyn ProviderAdapter {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }

    /// Transforms an image with the given provider.
    ///
    /// Always resolves to exactly one of `Success` or `Failure`. The
    /// caller is expected to have checked that `request.api_key` is set.
    pub async fn transform(&self, kind: ProviderKind, request: &TransformRequest) -> TransformResult {
        let adapter = self.adapter(kind);
        tracing::debug!(provider = adapter.name(), model = %request.model, "dispatching transformation");
        adapter.transform_image(request).await
    }

    /// Transforms an image with the provider, key and model selected in `settings`.
    pub async fn transform_with_settings(
        &self,
        settings: &Settings,
        image: InputImage,
        style: &str,
    ) -> TransformResult {
        let kind = settings.selected_provider;
        let request = TransformRequest::new(
            image,
            style,
            settings.api_key_for(kind),
            settings.selected_model.clone(),
        );
        self.transform(kind, &request).await
    }
}
