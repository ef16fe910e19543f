//! Image processing: the collaborator the renderer delegates pixel work to.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions`, SVG root attributes |
//! | **Resize** | Lanczos3 via `image` |
//! | **Encode** | JPEG, PNG, WebP, AVIF (rav1e) via `image` |
//! | **Passthrough** | byte copy for GIF and SVG |
//!
//! The module is split into:
//! - **Calculations**: pure width/height math (unit testable)
//! - **Parameters**: request and result types
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Cache**: content-addressed skip cache used by [`RustBackend`]

pub mod backend;
pub mod cache;
pub mod calculations;
mod params;
pub mod rust_backend;
mod svg;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use params::{
    EncoderOptions, FilenameFormat, FormatVariants, ImageMetadata, OutputLayout, ProcessRequest,
    ProcessedVariant, Quality, VariantStatus,
};
pub use rust_backend::RustBackend;
pub use svg::svg_dimensions;
