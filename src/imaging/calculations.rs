//! Pure calculation functions for output dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Width;

/// Represents a single output width to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

/// Scale a height to a new width, preserving aspect ratio (minimum 1px).
pub fn scaled_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return orig_h;
    }
    ((orig_h as f64 * width as f64 / orig_w as f64).round() as u32).max(1)
}

/// Calculate which widths to generate and their dimensions.
///
/// `Auto` resolves to the source width. Nothing is upscaled: widths larger
/// than the source are replaced by the source width, so a source narrower
/// than the largest request still gets its full-resolution candidate. The
/// result is sorted ascending with duplicates removed.
///
/// # Examples
/// ```
/// # use respimg::imaging::calculations::calculate_target_sizes;
/// # use respimg::types::Width;
/// let sizes = calculate_target_sizes((1200, 800), &[Width::Px(1440), Width::Px(960)]);
/// assert_eq!(sizes.iter().map(|s| s.width).collect::<Vec<_>>(), vec![960, 1200]);
/// ```
pub fn calculate_target_sizes(original: (u32, u32), widths: &[Width]) -> Vec<TargetSize> {
    let (orig_w, orig_h) = original;

    let mut result: Vec<u32> = widths
        .iter()
        .map(|w| match w {
            Width::Auto => orig_w,
            Width::Px(px) => *px,
        })
        .filter(|&w| w > 0)
        .map(|w| w.min(orig_w))
        .collect();

    if result.is_empty() {
        result.push(orig_w);
    }
    result.sort_unstable();
    result.dedup();

    result
        .into_iter()
        .map(|width| TargetSize {
            width,
            height: if width == orig_w {
                orig_h
            } else {
                scaled_height(original, width)
            },
        })
        .collect()
}
