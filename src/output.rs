//! CLI output formatting for rendered images.
//!
//! `render` writes markup to stdout and this summary to stderr, so the
//! markup can be piped straight into a template:
//!
//! ```text
//! photo.png (raster, development)
//!     png
//!         960px: encoded → /assets/images/photo-960.png
//!         1440px: cached → /assets/images/photo-1440.png
//!     jpeg
//!         960px: encoded → /assets/images/photo-960.jpeg
//!         1440px: encoded → /assets/images/photo-1440.jpeg
//! 4 variants: 3 encoded, 1 cached
//! ```
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that does the I/O.

use crate::imaging::{ImageMetadata, VariantStatus};
use crate::types::{AssetKind, Environment};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn kind_label(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Gif => "gif",
        AssetKind::Svg => "svg",
        AssetKind::Raster => "raster",
    }
}

fn status_label(status: VariantStatus) -> &'static str {
    match status {
        VariantStatus::Encoded => "encoded",
        VariantStatus::Passthrough => "copied",
        VariantStatus::Cached => "cached",
    }
}

/// Format the variant summary for one rendered source.
pub fn format_render_output(
    source: &Path,
    environment: Environment,
    metadata: &ImageMetadata,
) -> Vec<String> {
    let kind = AssetKind::from_path(source);
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    let mut lines = vec![format!("{} ({}, {})", name, kind_label(kind), environment.as_str())];

    let (mut encoded, mut copied, mut cached) = (0, 0, 0);
    for group in metadata.groups() {
        lines.push(format!("{}{}", indent(1), group.format));
        for v in &group.variants {
            match v.status {
                VariantStatus::Encoded => encoded += 1,
                VariantStatus::Passthrough => copied += 1,
                VariantStatus::Cached => cached += 1,
            }
            // SVGs without a resolvable size report width 0
            let size = if v.width == 0 {
                "unsized".to_string()
            } else {
                format!("{}px", v.width)
            };
            lines.push(format!(
                "{}{}: {} → {}",
                indent(2),
                size,
                status_label(v.status),
                v.url
            ));
        }
    }

    let total = encoded + copied + cached;
    let noun = if total == 1 { "variant" } else { "variants" };
    let mut parts = Vec::new();
    for (n, label) in [(encoded, "encoded"), (copied, "copied"), (cached, "cached")] {
        if n > 0 {
            parts.push(format!("{n} {label}"));
        }
    }
    if parts.is_empty() {
        lines.push(format!("0 {noun}"));
    } else {
        lines.push(format!("{total} {noun}: {}", parts.join(", ")));
    }
    lines
}

/// Print the variant summary to stderr.
pub fn print_render_output(source: &Path, environment: Environment, metadata: &ImageMetadata) {
    for line in format_render_output(source, environment, metadata) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::{
        EncoderOptions, FilenameFormat, OutputLayout, ProcessRequest, ProcessedVariant,
    };
    use crate::types::{ImageFormat, Width};

    fn variant(fmt: ImageFormat, width: u32, status: VariantStatus) -> ProcessedVariant {
        let request = ProcessRequest {
            source: "photo.png".into(),
            widths: vec![Width::Px(width)],
            formats: vec![fmt],
            layout: OutputLayout::default(),
            filename: FilenameFormat::Sized,
            options: EncoderOptions::default(),
        };
        let filename = FilenameFormat::Sized.filename("photo", width, fmt);
        ProcessedVariant::new(&request, fmt, filename, (width, width / 2), status)
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn raster_summary() {
        let mut meta = ImageMetadata::new();
        meta.insert(
            ImageFormat::Jpeg,
            vec![
                variant(ImageFormat::Jpeg, 960, VariantStatus::Encoded),
                variant(ImageFormat::Jpeg, 1440, VariantStatus::Cached),
            ],
        );
        let lines = format_render_output(Path::new("img/photo.png"), Environment::Development, &meta);
        assert_eq!(
            lines,
            vec![
                "photo.png (raster, development)",
                "    jpeg",
                "        960px: encoded → /assets/images/photo-960.jpeg",
                "        1440px: cached → /assets/images/photo-1440.jpeg",
                "2 variants: 1 encoded, 1 cached",
            ]
        );
    }

    #[test]
    fn passthrough_summary() {
        let mut meta = ImageMetadata::new();
        let mut v = variant(ImageFormat::Gif, 320, VariantStatus::Passthrough);
        v.url = "/assets/images/anim.gif".into();
        meta.insert(ImageFormat::Gif, vec![v]);

        let lines = format_render_output(Path::new("anim.gif"), Environment::Production, &meta);
        assert_eq!(lines[0], "anim.gif (gif, production)");
        assert_eq!(lines[2], "        320px: copied → /assets/images/anim.gif");
        assert_eq!(lines[3], "1 variant: 1 copied");
    }

    #[test]
    fn unsized_svg_summary() {
        let mut meta = ImageMetadata::new();
        let mut v = variant(ImageFormat::Svg, 0, VariantStatus::Passthrough);
        v.url = "/assets/images/logo.svg".into();
        meta.insert(ImageFormat::Svg, vec![v]);

        let lines = format_render_output(Path::new("logo.svg"), Environment::Development, &meta);
        assert_eq!(lines[2], "        unsized: copied → /assets/images/logo.svg");
    }

    #[test]
    fn empty_metadata_summary() {
        let lines = format_render_output(
            Path::new("photo.png"),
            Environment::Development,
            &ImageMetadata::new(),
        );
        assert_eq!(lines.last().unwrap(), "0 variants");
    }
}
