//! Provider adapters.

mod gemini;
mod openai;

pub use gemini::{GeminiAdapter, GeminiAdapterBuilder, GEMINI_PROMPTS};
pub use openai::{OpenAiAdapter, OpenAiAdapterBuilder, OPENAI_PROMPTS};

/// Shown when a successful response carries no image.
pub(crate) const NO_IMAGE_DATA: &str = "No image data received from API";

/// Returns the reason phrase for a status, or its code if it has none.
pub(crate) fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_u16().to_string())
}
