//! Image processing backend trait and shared errors.
//!
//! The [`ImageBackend`] trait is the seam between markup rendering and pixel
//! work: the renderer describes what it needs with a
//! [`ProcessRequest`], awaits the backend, and builds HTML from the returned
//! [`ImageMetadata`].
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests use the
//! recording `MockBackend` in this module's test submodule.

use super::params::{ImageMetadata, ProcessRequest};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Failed to encode {format}: {reason}")]
    Encode { format: String, reason: String },
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Processing task failed: {0}")]
    Task(String),
}

/// Intrinsic size of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// A call writes every requested (format, width) variant into
/// `request.layout.output_dir` and reports them grouped by format, in the
/// order the formats were requested, widths ascending.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    async fn process(&self, request: &ProcessRequest) -> Result<ImageMetadata, BackendError>;
}
