//! Request and result types exchanged with an image backend.
//!
//! A [`ProcessRequest`] describes *what* to produce: widths, formats, where
//! files go and how they are named. An [`ImageMetadata`] describes *what was
//! produced*: one ordered group of [`ProcessedVariant`]s per format. Backends
//! sit between the two and do the pixel work.

use crate::naming;
use crate::types::{ImageFormat, Width};
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100). Only constructed
/// through [`Quality::new`], so the value always fits in a `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Encoder options passed through to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderOptions {
    pub jpeg_quality: Quality,
    /// Keep every frame of animated sources.
    pub animated: bool,
}

/// How output files are named.
///
/// Both variants delegate to [`naming::output_filename`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameFormat {
    /// `{stem}.{format}`
    Passthrough,
    /// `{stem}-{width}.{format}`
    Sized,
}

impl FilenameFormat {
    pub fn filename(self, stem: &str, width: u32, format: ImageFormat) -> String {
        match self {
            Self::Passthrough => naming::output_filename(stem, None, format.as_str()),
            Self::Sized => {
                naming::output_filename(stem, Some(&width.to_string()), format.as_str())
            }
        }
    }
}

/// Where generated files are written and how they are addressed publicly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// Public URL prefix, ending with `/`.
    pub url_path: String,
    /// Filesystem directory the files are written to.
    pub output_dir: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self {
            url_path: naming::DEFAULT_URL_PATH.to_string(),
            output_dir: PathBuf::from("./dist/assets/images/"),
        }
    }
}

/// Everything a backend needs to generate the variants of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRequest {
    pub source: PathBuf,
    pub widths: Vec<Width>,
    pub formats: Vec<ImageFormat>,
    pub layout: OutputLayout,
    pub filename: FilenameFormat,
    pub options: EncoderOptions,
}

impl ProcessRequest {
    /// Public URL of a generated file.
    pub fn url_for(&self, filename: &str) -> String {
        format!("{}{}", self.layout.url_path, filename)
    }
}

/// How a variant came to exist on disk during this call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    Encoded,
    /// Copied unchanged from the source.
    Passthrough,
    /// Reused from a previous run.
    Cached,
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedVariant {
    pub format: ImageFormat,
    pub url: String,
    pub filename: String,
    pub width: u32,
    pub height: u32,
    /// MIME type for `<source type=…>`.
    pub source_type: String,
    /// `"{url} {width}w"` fragment for a `srcset` list.
    pub srcset: String,
    pub status: VariantStatus,
}

impl ProcessedVariant {
    pub fn new(
        request: &ProcessRequest,
        format: ImageFormat,
        filename: String,
        (width, height): (u32, u32),
        status: VariantStatus,
    ) -> Self {
        let url = request.url_for(&filename);
        Self {
            format,
            srcset: format!("{url} {width}w"),
            url,
            filename,
            width,
            height,
            source_type: format.mime_type().to_string(),
            status,
        }
    }
}

/// Variants of one format, ordered by ascending width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatVariants {
    pub format: ImageFormat,
    pub variants: Vec<ProcessedVariant>,
}

impl FormatVariants {
    /// Comma-joined srcset of every width in this format.
    pub fn srcset(&self) -> String {
        self.variants
            .iter()
            .map(|v| v.srcset.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn source_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// Backend output: variant groups in the order the formats were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    groups: Vec<FormatVariants>,
}

impl ImageMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group. A format that is already present is replaced in place.
    pub fn insert(&mut self, format: ImageFormat, variants: Vec<ProcessedVariant>) {
        match self.groups.iter_mut().find(|g| g.format == format) {
            Some(group) => group.variants = variants,
            None => self.groups.push(FormatVariants { format, variants }),
        }
    }

    pub fn get(&self, format: ImageFormat) -> Option<&[ProcessedVariant]> {
        self.groups
            .iter()
            .find(|g| g.format == format)
            .map(|g| g.variants.as_slice())
    }

    /// Smallest variant of a format.
    pub fn first(&self, format: ImageFormat) -> Option<&ProcessedVariant> {
        self.get(format).and_then(|v| v.first())
    }

    pub fn groups(&self) -> impl Iterator<Item = &FormatVariants> {
        self.groups.iter()
    }

    pub fn formats(&self) -> Vec<ImageFormat> {
        self.groups.iter().map(|g| g.format).collect()
    }
}
