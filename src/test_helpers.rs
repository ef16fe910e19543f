//! Shared test utilities: synthetic source images written to disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let src = tmp.path().join("photo.png");
//! create_test_png(&src, 1600, 900);
//! ```

use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::{Delay, Frame, ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save(path).unwrap();
}

/// Create a two-frame animated GIF.
pub fn create_test_gif(path: &Path, width: u32, height: u32) {
    let frames = [[255, 0, 0, 255], [0, 0, 255, 255]].map(|px| {
        Frame::from_parts(
            RgbaImage::from_pixel(width, height, image::Rgba(px)),
            0,
            0,
            Delay::from_numer_denom_ms(100, 1),
        )
    });
    let file = std::fs::File::create(path).unwrap();
    GifEncoder::new(file).encode_frames(frames).unwrap();
}

/// Write a minimal SVG with explicit width and height.
pub fn write_test_svg(path: &Path, width: u32, height: u32) {
    let svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="{width}" height="{height}" fill="teal"/></svg>"#
    );
    std::fs::write(path, svg).unwrap();
}
