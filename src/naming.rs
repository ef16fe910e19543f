//! Centralized output naming for generated image assets.
//!
//! Every generated file follows one of two patterns:
//!
//! - `{stem}-{width}.{format}` for resized raster variants
//! - `{stem}.{format}` for passthrough GIF and SVG files
//!
//! [`output_filename`] is the only place this rule is written down. The
//! public URL helper ([`img_size`]) and the backends' filename callback
//! ([`FilenameFormat`](crate::imaging::FilenameFormat)) both call it, so a
//! template that links `img_size("photo.png")` always points at a file the
//! backend actually wrote.
//!
//! ## Examples
//!
//! - `img_size("photo.png")` → `/assets/images/photo-960.jpeg`
//! - `img_size_with("anim.gif", "400", "webp")` → `/assets/images/anim.gif`

use crate::types::{AssetKind, ImageFormat};
use std::path::Path;

/// Public URL prefix for generated images.
pub const DEFAULT_URL_PATH: &str = "/assets/images/";
/// Width token used when a template doesn't ask for one.
pub const DEFAULT_SIZE: &str = "960";
/// Format token used when a template doesn't ask for one.
pub const DEFAULT_FORMAT: &str = "jpeg";

/// Base name of a source file without directory or extension.
///
/// `"img/photo.final.png"` → `"photo.final"`. Degenerate paths yield `""`.
pub fn source_stem(src: &Path) -> String {
    src.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build an output filename. `width: None` selects the passthrough pattern.
pub fn output_filename(stem: &str, width: Option<&str>, format: &str) -> String {
    match width {
        Some(w) => format!("{stem}-{w}.{format}"),
        None => format!("{stem}.{format}"),
    }
}

/// Public URL for an image asset with the default size and format.
pub fn img_size(src: impl AsRef<Path>) -> String {
    img_size_with(src, DEFAULT_SIZE, DEFAULT_FORMAT)
}

/// Public URL for an image asset at a given size token and format token.
///
/// GIF sources ignore both tokens and keep their original name.
pub fn img_size_with(src: impl AsRef<Path>, size: &str, format: &str) -> String {
    img_url(DEFAULT_URL_PATH, src, size, format)
}

/// Like [`img_size_with`] but under a caller-supplied URL prefix.
///
/// The prefix is used verbatim and is expected to end with `/`.
pub fn img_url(url_path: &str, src: impl AsRef<Path>, size: &str, format: &str) -> String {
    let src = src.as_ref();
    let stem = source_stem(src);
    let filename = match AssetKind::from_path(src) {
        AssetKind::Gif => output_filename(&stem, None, ImageFormat::Gif.as_str()),
        AssetKind::Svg | AssetKind::Raster => output_filename(&stem, Some(size), format),
    };
    format!("{url_path}{filename}")
}
