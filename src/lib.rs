#![warn(missing_docs)]
//! Restyle - bring-your-own-key image restyling.
//!
//! Upload an image, pick a style, and get a transformed image back from
//! OpenAI image edits or Gemini multimodal generation, using your own API
//! key. Settings (keys, provider, model) persist locally.
//!
//! # Quick Start
//!
//! ```no_run
//! use restyle::{FileStorage, InputImage, SettingsStore, TransformPipeline, TransformResult};
//!
//! #[tokio::main]
//! async fn main() -> restyle::Result<()> {
//!     let store = SettingsStore::open(FileStorage::open_default()?);
//!     if !store.is_configured() {
//!         eprintln!("Please configure your API key in settings");
//!         return Ok(());
//!     }
//!
//!     let image = InputImage::from_path("portrait.jpg")?;
//!     let pipeline = TransformPipeline::default();
//!     match pipeline.transform_with_settings(store.get(), image, "watercolor").await {
//!         TransformResult::Success { image } => println!("done: {:?}", image.as_url()),
//!         TransformResult::Failure { message } => eprintln!("failed: {message}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `cli` (default): the `restyle` command-line tool

mod error;
pub mod settings;
pub mod transform;

// Re-export error types at crate root
pub use error::{truncate_preview, RestyleError, Result, PREVIEW_CHARS};

pub use settings::{
    FileStorage, MemoryStorage, Settings, SettingsPatch, SettingsStorage, SettingsStore,
    STORAGE_KEY,
};

pub use transform::providers::{
    GeminiAdapter, GeminiAdapterBuilder, OpenAiAdapter, OpenAiAdapterBuilder,
};
pub use transform::{
    adapter_for, ImageBlob, ImageFormat, ImageReference, InputImage, ProviderAdapter,
    ProviderKind, TransformPipeline, TransformRequest, TransformResult,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{RestyleError, Result};
    pub use crate::settings::{Settings, SettingsPatch, SettingsStorage, SettingsStore};
    pub use crate::transform::{
        ImageReference, InputImage, ProviderAdapter, ProviderKind, TransformPipeline,
        TransformRequest, TransformResult,
    };
}
