//! Shared types used by the URL formatter, the renderer, and the backends.
//!
//! These are the vocabulary of the crate: what kind of asset a source file
//! is, which formats can be produced, how widths are requested, and which
//! build environment is active.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown image format: {0}")]
pub struct UnknownFormat(pub String);

/// Output format identifiers understood by the image backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Avif,
    Webp,
    Jpeg,
    Png,
    Gif,
    Svg,
}

impl ImageFormat {
    /// The token used in filenames and configuration (`jpeg`, not `jpg`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Avif => "avif",
            Self::Webp => "webp",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }

    /// MIME type advertised on `<source type=…>`.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Avif => "image/avif",
            Self::Webp => "image/webp",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Formats that are copied byte-for-byte rather than re-encoded.
    pub fn is_passthrough(self) -> bool {
        matches!(self, Self::Gif | Self::Svg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "avif" => Ok(Self::Avif),
            "webp" => Ok(Self::Webp),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "svg" => Ok(Self::Svg),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

/// The closed set of asset kinds the renderer branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// Animated GIF, passed through untouched.
    Gif,
    /// Vector image, passed through untouched.
    Svg,
    /// Anything else: resized into several widths and formats.
    Raster,
}

impl AssetKind {
    /// Classify a source path by its extension (case-insensitive).
    ///
    /// Paths without an extension are treated as raster.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gif") => Self::Gif,
            Some(ext) if ext.eq_ignore_ascii_case("svg") => Self::Svg,
            _ => Self::Raster,
        }
    }

    /// The single output format for passthrough kinds, `None` for raster.
    pub fn passthrough_format(self) -> Option<ImageFormat> {
        match self {
            Self::Gif => Some(ImageFormat::Gif),
            Self::Svg => Some(ImageFormat::Svg),
            Self::Raster => None,
        }
    }
}

/// A requested output width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    /// Keep the source's own width.
    Auto,
    Px(u32),
}

/// Build environment. Selects the raster format set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Map an environment variable value: only `"production"` is production.
    pub fn from_env_value(value: &str) -> Self {
        if value == "production" {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}
