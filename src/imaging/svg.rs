//! Intrinsic size of an SVG document.
//!
//! SVGs are passed through untouched; the size is informational. It comes
//! from the root `<svg>` element: explicit `width`/`height` attributes win,
//! otherwise the `viewBox` extent is used.

use super::backend::{BackendError, Dimensions};
use std::path::Path;

/// CSS pixels per unit for the absolute length units.
const ABSOLUTE_UNITS: [(&str, f64); 6] = [
    ("px", 1.0),
    ("pt", 96.0 / 72.0),
    ("pc", 16.0),
    ("mm", 96.0 / 25.4),
    ("cm", 96.0 / 2.54),
    ("in", 96.0),
];

/// Size of an SVG file. A document whose size can't be resolved reports
/// 0×0 instead of failing, since the copy itself doesn't need it.
pub fn identify_svg(path: &Path) -> Result<Dimensions, BackendError> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(svg_dimensions(&content).unwrap_or_else(|| {
        tracing::debug!(path = %path.display(), "svg has no resolvable size");
        Dimensions {
            width: 0,
            height: 0,
        }
    }))
}

/// Parse dimensions from SVG source text.
pub fn svg_dimensions(content: &str) -> Option<Dimensions> {
    let tag = root_tag(content)?;
    let attrs = attributes(tag);
    let find = |name: &str| {
        attrs
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    };

    let explicit_w = find("width").and_then(parse_length);
    let explicit_h = find("height").and_then(parse_length);
    let view_box = find("viewBox").and_then(parse_view_box);

    let (width, height) = match (explicit_w, explicit_h, view_box) {
        (Some(w), Some(h), _) => (w, h),
        (Some(w), None, Some((vw, vh))) if vw > 0.0 => (w, w * vh / vw),
        (None, Some(h), Some((vw, vh))) if vh > 0.0 => (h * vw / vh, h),
        (_, _, Some((vw, vh))) => (vw, vh),
        _ => return None,
    };

    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Dimensions {
        width: width.round() as u32,
        height: height.round() as u32,
    })
}

/// Attribute text of the first `<svg …>` element.
fn root_tag(content: &str) -> Option<&str> {
    let start = content.find("<svg")? + "<svg".len();
    let rest = &content[start..];
    let end = rest.find('>')?;
    Some(rest[..end].trim_end_matches('/'))
}

fn attributes(tag: &str) -> Vec<(&str, &str)> {
    let mut attrs = Vec::new();
    let mut rest = tag;
    while let Some(eq) = rest.find('=') {
        let name = rest[..eq]
            .split_whitespace()
            .next_back()
            .unwrap_or_default();
        let after = rest[eq + 1..].trim_start();
        let Some(quote) = after.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            break;
        };
        let value_start = &after[1..];
        let Some(end) = value_start.find(quote) else {
            break;
        };
        attrs.push((name, &value_start[..end]));
        rest = &value_start[end + 1..];
    }
    attrs
}

/// Absolute lengths only: a bare number or one of [`ABSOLUTE_UNITS`].
/// Percentages and font-relative units can't be resolved without a viewport.
fn parse_length(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, scale) = ABSOLUTE_UNITS
        .iter()
        .find_map(|&(unit, scale)| value.strip_suffix(unit).map(|n| (n, scale)))
        .unwrap_or((value, 1.0));
    let n = number.trim().parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(n * scale)
}

fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [_, _, w, h] => Some((*w, *h)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(content: &str) -> Option<(u32, u32)> {
        svg_dimensions(content).map(|d| (d.width, d.height))
    }

    #[test]
    fn explicit_width_and_height() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="80"></svg>"#;
        assert_eq!(dims(svg), Some((120, 80)));
    }

    #[test]
    fn px_units_are_accepted() {
        let svg = r#"<svg width="120px" height="80.4px"/>"#;
        assert_eq!(dims(svg), Some((120, 80)));
    }

    #[test]
    fn view_box_fallback() {
        let svg = r#"<?xml version="1.0"?><svg viewBox="0 0 300 150"><rect/></svg>"#;
        assert_eq!(dims(svg), Some((300, 150)));
    }

    #[test]
    fn one_side_scaled_from_view_box() {
        let svg = r#"<svg width="600" viewBox="0,0,300,150"></svg>"#;
        assert_eq!(dims(svg), Some((600, 300)));
    }

    #[test]
    fn percentage_width_uses_view_box() {
        let svg = r#"<svg width="100%" height="100%" viewBox="0 0 64 32"></svg>"#;
        assert_eq!(dims(svg), Some((64, 32)));
    }

    #[test]
    fn stroke_width_is_not_width() {
        let svg = r#"<svg stroke-width="3" viewBox="0 0 10 20"></svg>"#;
        assert_eq!(dims(svg), Some((10, 20)));
    }

    #[test]
    fn single_quoted_attributes() {
        let svg = "<svg width='40' height='30'></svg>";
        assert_eq!(dims(svg), Some((40, 30)));
    }

    #[test]
    fn absolute_units_convert_to_px() {
        assert_eq!(dims(r#"<svg width="48pt" height="24pt"/>"#), Some((64, 32)));
        assert_eq!(dims(r#"<svg width="1in" height="2pc"/>"#), Some((96, 32)));
        assert_eq!(dims(r#"<svg width="25.4mm" height="2.54cm"/>"#), Some((96, 96)));
    }

    #[test]
    fn relative_units_fall_back_to_view_box() {
        let svg = r#"<svg width="10em" height="5em" viewBox="0 0 160 80"/>"#;
        assert_eq!(dims(svg), Some((160, 80)));
        assert_eq!(dims(r#"<svg width="10em" height="5em"/>"#), None);
    }

    #[test]
    fn unsized_file_identifies_as_zero() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logo.svg");
        std::fs::write(&path, "<svg><circle r=\"4\"/></svg>").unwrap();
        assert_eq!(
            identify_svg(&path).unwrap(),
            Dimensions {
                width: 0,
                height: 0
            }
        );
    }

    #[test]
    fn missing_file_is_error() {
        assert!(identify_svg(Path::new("/nonexistent/logo.svg")).is_err());
    }

    #[test]
    fn missing_everything_is_none() {
        assert_eq!(dims("<svg></svg>"), None);
        assert_eq!(dims("not an svg"), None);
    }
}
