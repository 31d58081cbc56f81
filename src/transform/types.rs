//! Core types for image transformation.

use crate::error::{RestyleError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Maps a MIME type (e.g. `image/jpeg`) to a format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// MIME type used when an input file is not a recognised image.
const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Raw image content supplied by the caller, with its MIME type.
#[derive(Clone)]
pub struct InputImage {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type of `data`, e.g. `image/png`.
    pub mime_type: String,
}

impl InputImage {
    /// Creates an input image from bytes and an explicit MIME type.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Creates an input image, detecting the MIME type from magic bytes.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = ImageFormat::from_magic_bytes(&data)
            .map(|f| f.mime_type())
            .unwrap_or(UNKNOWN_MIME_TYPE);
        Self::new(data, mime_type)
    }

    /// Reads an image file. The MIME type comes from the file's magic
    /// bytes, then its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let format = ImageFormat::from_magic_bytes(&data).or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(ImageFormat::from_extension)
        });
        let mime_type = format.map(|f| f.mime_type()).unwrap_or(UNKNOWN_MIME_TYPE);
        Ok(Self::new(data, mime_type))
    }

    /// Returns the format matching the MIME type, if it is a known one.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Returns true if the MIME type names an image.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl std::fmt::Debug for InputImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputImage")
            .field("mime_type", &self.mime_type)
            .field("size", &self.data.len())
            .finish()
    }
}

/// A request to transform one image in one style.
#[derive(Clone)]
pub struct TransformRequest {
    /// The image to transform.
    pub image: InputImage,
    /// Style token selecting a prompt. Unknown tokens use the default prompt.
    pub style: String,
    /// Credential for the selected provider.
    pub api_key: String,
    /// Provider model identifier, e.g. `gpt-image-1`.
    pub model: String,
}

impl TransformRequest {
    /// Creates a new request.
    pub fn new(
        image: InputImage,
        style: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            image,
            style: style.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

// The API key stays out of debug output.
impl std::fmt::Debug for TransformRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRequest")
            .field("image", &self.image)
            .field("style", &self.style)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

/// Decoded image bytes produced locally from a base64 payload.
///
/// The bytes are owned by whoever holds the blob and are released when
/// it is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "transformed image should be saved or displayed"]
pub struct ImageBlob {
    /// Raw image bytes.
    pub data: Vec<u8>,
    /// MIME type reported for the bytes.
    pub mime_type: String,
}

impl ImageBlob {
    /// Creates a new blob.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Returns the format, from the MIME type or else the magic bytes.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
            .or_else(|| ImageFormat::from_magic_bytes(&self.data))
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Saves the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }

    /// Encodes the image data as base64.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a data URL.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

/// Handle to a transformed image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReference {
    /// Remote URL owned by the provider, passed through unchanged.
    Url(String),
    /// Image decoded locally from the response.
    Blob(ImageBlob),
}

impl ImageReference {
    /// Returns the URL for a remote image.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Blob(_) => None,
        }
    }

    /// Returns the blob for a locally decoded image.
    pub fn as_blob(&self) -> Option<&ImageBlob> {
        match self {
            Self::Url(_) => None,
            Self::Blob(blob) => Some(blob),
        }
    }
}

/// Outcome of one transformation. Always exactly one variant, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a failed transformation is only visible through this value"]
pub enum TransformResult {
    /// The provider produced an image.
    Success {
        /// The transformed image.
        image: ImageReference,
    },
    /// The transformation failed.
    Failure {
        /// Human-readable diagnostic.
        message: String,
    },
}

impl TransformResult {
    /// Creates a failure with the given message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    /// Returns true for [`TransformResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Returns the image of a successful transformation.
    pub fn image(&self) -> Option<&ImageReference> {
        match self {
            Self::Success { image } => Some(image),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the message of a failed transformation.
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { message } => Some(message),
        }
    }

    /// Converts into a standard `Result`, with the failure message as the error.
    pub fn into_result(self) -> std::result::Result<ImageReference, String> {
        match self {
            Self::Success { image } => Ok(image),
            Self::Failure { message } => Err(message),
        }
    }
}

impl From<Result<ImageReference>> for TransformResult {
    fn from(result: Result<ImageReference>) -> Self {
        match result {
            Ok(image) => Self::Success { image },
            Err(e) => Self::Failure {
                message: e.user_message(),
            },
        }
    }
}

impl From<RestyleError> for TransformResult {
    fn from(e: RestyleError) -> Self {
        Self::Failure {
            message: e.user_message(),
        }
    }
}
