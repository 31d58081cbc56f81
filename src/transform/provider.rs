//! Provider adapter trait and provider kinds.

use crate::transform::types::{TransformRequest, TransformResult};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Image transformation provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI image edits (gpt-image-1, DALL-E).
    OpenAi,
    /// Google Gemini multimodal image generation.
    Gemini,
}

impl ProviderKind {
    /// All provider kinds, in display order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

    /// Maps a provider name to a kind. Unknown names select Gemini.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            "gemini" => Self::Gemini,
            _ => Self::Gemini,
        }
    }

    /// Returns the lowercase identifier used in settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Returns the model identifiers selectable for this provider.
    pub fn models(&self) -> &'static [&'static str] {
        match self {
            Self::OpenAi => &["gpt-image-1", "dall-e-3", "dall-e-2"],
            Self::Gemini => &["gemini-2.0-flash-preview-image-generation"],
        }
    }

    /// Returns the model selected when switching to this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "dall-e-2",
            Self::Gemini => "gemini-2.0-flash-preview-image-generation",
        }
    }

    /// Returns true if `model` is one of [`ProviderKind::models`].
    pub fn supports_model(&self, model: &str) -> bool {
        self.models().contains(&model)
    }

    /// Returns the name of this provider for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Gemini => "Google Gemini",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl Serialize for ProviderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// Trait for provider adapters.
///
/// An adapter turns a [`TransformRequest`] into exactly one call against
/// its provider and normalizes the response. Implementations must not
/// panic and report every failure as [`TransformResult::Failure`].
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Transforms the request's image. Never retries.
    async fn transform_image(&self, request: &TransformRequest) -> TransformResult;

    /// Returns the kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        self.kind().display_name()
    }
}
