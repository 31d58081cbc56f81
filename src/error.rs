//! Error types for image transformation and settings persistence.

/// Errors that can occur while transforming an image or persisting settings.
///
/// Adapters return these internally and convert them into
/// [`TransformResult::Failure`](crate::TransformResult::Failure) at their
/// boundary, so callers of the pipeline never see this type directly.
#[derive(Debug, thiserror::Error)]
pub enum RestyleError {
    /// API key rejected by the provider.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A successful response was missing the expected fields.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading the input image or saving the result).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings could not be written to or read from storage.
    #[error("settings storage error: {0}")]
    Storage(String),
}

impl RestyleError {
    /// Returns the message shown to the user when this error ends a transformation.
    ///
    /// Provider-supplied messages are passed through without the variant prefix.
    pub fn user_message(&self) -> String {
        match self {
            Self::Auth(message)
            | Self::Api { message, .. }
            | Self::InvalidRequest(message)
            | Self::UnexpectedResponse(message)
            | Self::Storage(message) => message.clone(),
            Self::Decode(message) => format!("Failed to decode image data: {message}"),
            Self::Network(e) => format!("Network request failed: {e}"),
            Self::Io(e) => e.to_string(),
            Self::Json(e) => format!("Malformed response from API: {e}"),
        }
    }
}

/// Result type alias for transformation and settings operations.
pub type Result<T> = std::result::Result<T, RestyleError>;

/// Maximum characters of a raw response body kept in error messages and logs.
pub const PREVIEW_CHARS: usize = 100;

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
