//! Image transformation module.

mod pipeline;
mod provider;
pub mod providers;
pub mod style;
mod types;

pub use pipeline::{adapter_for, adapter_for_name, TransformPipeline};
pub use provider::{ProviderAdapter, ProviderKind};
pub use types::{
    ImageBlob, ImageFormat, ImageReference, InputImage, TransformRequest, TransformResult,
};
