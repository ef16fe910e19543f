//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (raster, GIF) | `image::image_dimensions` |
//! | Identify (SVG) | root `<svg>` attributes ([`svg`](super::svg)) |
//! | Decode | `image::ImageReader` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG / PNG | `image::codecs::{jpeg, png}` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | GIF / SVG passthrough | byte copy |
//!
//! All pixel work runs on a blocking thread; variants of one source are
//! encoded in parallel with rayon.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::cache::{self, CacheLookup, CacheManifest};
use super::calculations::{TargetSize, calculate_target_sizes};
use super::params::{
    ImageMetadata, ProcessRequest, ProcessedVariant, Quality, VariantStatus,
};
use super::svg;
use crate::naming;
use crate::types::{AssetKind, ImageFormat};
use async_trait::async_trait;
use image::codecs::avif::AvifEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Frame, ImageReader};
use rayon::prelude::*;
use std::borrow::Cow;
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    use_cache: bool,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { use_cache: true }
    }

    /// Enable or disable the encoding cache.
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageBackend for RustBackend {
    async fn process(&self, request: &ProcessRequest) -> Result<ImageMetadata, BackendError> {
        let request = request.clone();
        let use_cache = self.use_cache;
        tokio::task::spawn_blocking(move || process_blocking(&request, use_cache))
            .await
            .map_err(|e| BackendError::Task(e.to_string()))?
    }
}

/// One output file to produce.
struct Job {
    format: ImageFormat,
    size: TargetSize,
    filename: String,
    params_hash: String,
}

fn image_error(path: &Path, err: image::ImageError) -> BackendError {
    match err {
        image::ImageError::IoError(io) => BackendError::Io(io),
        other => BackendError::Decode {
            path: path.display().to_string(),
            reason: other.to_string(),
        },
    }
}

fn identify(path: &Path) -> Result<Dimensions, BackendError> {
    if AssetKind::from_path(path) == AssetKind::Svg {
        return svg::identify_svg(path);
    }
    let (width, height) = image::image_dimensions(path).map_err(|e| image_error(path, e))?;
    Ok(Dimensions { width, height })
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| image_error(path, e))
}

fn process_blocking(
    request: &ProcessRequest,
    use_cache: bool,
) -> Result<ImageMetadata, BackendError> {
    let source = request.source.as_path();
    let output_dir = request.layout.output_dir.as_path();
    let quality = request.options.jpeg_quality;
    let animated = request.options.animated;

    std::fs::create_dir_all(output_dir)?;
    let stem = naming::source_stem(source);
    let dims = identify(source)?;
    let source_bytes = std::fs::read(source)?;
    let source_hash = cache::hash_bytes(&source_bytes);
    let source_kind = AssetKind::from_path(source);

    // Loaded even with the cache off: every file written here must replace
    // its manifest entry, or a later cached run would trust stale bytes.
    let mut manifest = CacheManifest::load(output_dir);

    let mut jobs = Vec::new();
    for &format in &request.formats {
        let sizes = if format.is_passthrough() {
            if source_kind.passthrough_format() != Some(format) {
                return Err(BackendError::UnsupportedFormat(format!(
                    "cannot convert {} to {format}",
                    source.display()
                )));
            }
            vec![TargetSize {
                width: dims.width,
                height: dims.height,
            }]
        } else {
            calculate_target_sizes((dims.width, dims.height), &request.widths)
        };
        for size in sizes {
            jobs.push(Job {
                format,
                size,
                filename: request.filename.filename(&stem, size.width, format),
                params_hash: cache::hash_variant_params(
                    format,
                    size.width,
                    quality.value(),
                    animated,
                ),
            });
        }
    }

    let mut statuses = Vec::with_capacity(jobs.len());
    let mut pending = Vec::new();
    for (idx, job) in jobs.iter().enumerate() {
        let copy_verbatim =
            job.format == ImageFormat::Svg || (job.format == ImageFormat::Gif && animated);
        if copy_verbatim {
            std::fs::write(output_dir.join(&job.filename), &source_bytes)?;
            manifest.remove(&job.filename);
            statuses.push(VariantStatus::Passthrough);
            continue;
        }
        if !use_cache {
            pending.push(idx);
            statuses.push(VariantStatus::Encoded);
            continue;
        }
        match manifest.lookup(&job.filename, &source_hash, &job.params_hash, output_dir) {
            CacheLookup::Hit => {
                tracing::debug!(file = %job.filename, "cache hit");
                statuses.push(VariantStatus::Cached);
            }
            CacheLookup::Moved(previous) => {
                tracing::debug!(file = %job.filename, from = %previous, "cache hit under old name");
                std::fs::copy(output_dir.join(&previous), output_dir.join(&job.filename))?;
                statuses.push(VariantStatus::Cached);
            }
            CacheLookup::Miss => {
                pending.push(idx);
                statuses.push(VariantStatus::Encoded);
            }
        }
    }

    if !pending.is_empty() {
        let img = load_image(source)?;
        pending
            .par_iter()
            .map(|&idx| encode_variant(&img, &jobs[idx], output_dir, quality))
            .collect::<Result<Vec<()>, BackendError>>()?;
    }

    for (job, status) in jobs.iter().zip(&statuses) {
        if *status != VariantStatus::Passthrough {
            manifest.insert(job.filename.clone(), source_hash.clone(), job.params_hash.clone());
        }
    }
    manifest.save(output_dir)?;

    let mut metadata = ImageMetadata::new();
    for &format in &request.formats {
        let variants = jobs
            .iter()
            .zip(&statuses)
            .filter(|(job, _)| job.format == format)
            .map(|(job, status)| {
                ProcessedVariant::new(
                    request,
                    format,
                    job.filename.clone(),
                    (job.size.width, job.size.height),
                    *status,
                )
            })
            .collect();
        metadata.insert(format, variants);
    }

    tracing::info!(
        source = %source.display(),
        variants = jobs.len(),
        encoded = pending.len(),
        "processed image"
    );
    Ok(metadata)
}

fn encode_variant(
    img: &DynamicImage,
    job: &Job,
    output_dir: &Path,
    quality: Quality,
) -> Result<(), BackendError> {
    let TargetSize { width, height } = job.size;
    let resized = if img.width() == width && img.height() == height {
        Cow::Borrowed(img)
    } else {
        Cow::Owned(img.resize_exact(width, height, FilterType::Lanczos3))
    };
    let path = output_dir.join(&job.filename);
    save_image(&resized, &path, job.format, quality)?;
    tracing::debug!(file = %job.filename, width, height, "encoded variant");
    Ok(())
}

/// Encode and save in the given format.
///
/// JPEG and AVIF are lossy and use `quality`; WebP is lossless.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    let q = u8::try_from(quality.value()).unwrap_or(100);
    let result = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(writer, q)),
        ImageFormat::Png => img.write_with_encoder(PngEncoder::new(writer)),
        ImageFormat::Webp => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(writer)),
        ImageFormat::Avif => DynamicImage::ImageRgba8(img.to_rgba8())
            .write_with_encoder(AvifEncoder::new_with_speed_quality(writer, 6, q)),
        ImageFormat::Gif => {
            let mut encoder = GifEncoder::new(writer);
            encoder.encode_frame(Frame::new(img.to_rgba8()))
        }
        ImageFormat::Svg => {
            return Err(BackendError::UnsupportedFormat(
                "svg output requires an svg source".into(),
            ));
        }
    };
    result.map_err(|e| BackendError::Encode {
        format: format.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{EncoderOptions, FilenameFormat, OutputLayout};
    use crate::test_helpers::*;
    use crate::types::Width;
    use tempfile::TempDir;

    fn request(tmp: &TempDir, source: &Path, formats: Vec<ImageFormat>) -> ProcessRequest {
        ProcessRequest {
            source: source.to_path_buf(),
            widths: vec![Width::Px(960), Width::Px(1440)],
            formats,
            layout: OutputLayout {
                url_path: "/assets/images/".into(),
                output_dir: tmp.path().join("out"),
            },
            filename: FilenameFormat::Sized,
            options: EncoderOptions::default(),
        }
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        assert_eq!(
            identify(&path).unwrap(),
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        assert!(identify(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn identify_svg_uses_attributes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logo.svg");
        write_test_svg(&path, 120, 60);
        assert_eq!(identify(&path).unwrap().width, 120);
    }

    #[test]
    fn raster_generates_every_format_and_width() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.png");
        create_test_png(&src, 1600, 800);

        let req = request(&tmp, &src, vec![ImageFormat::Png, ImageFormat::Jpeg]);
        let meta = process_blocking(&req, false).unwrap();

        assert_eq!(meta.formats(), vec![ImageFormat::Png, ImageFormat::Jpeg]);
        let jpeg = meta.get(ImageFormat::Jpeg).unwrap();
        // 1440 fits, 960 fits
        assert_eq!(jpeg.len(), 2);
        assert_eq!((jpeg[0].width, jpeg[0].height), (960, 480));
        assert_eq!((jpeg[1].width, jpeg[1].height), (1440, 720));

        for name in ["photo-960.png", "photo-1440.png", "photo-960.jpeg", "photo-1440.jpeg"] {
            let path = tmp.path().join("out").join(name);
            assert!(path.exists(), "missing {name}");
        }
        let written = image::image_dimensions(tmp.path().join("out/photo-960.jpeg")).unwrap();
        assert_eq!(written, (960, 480));
    }

    #[test]
    fn small_source_is_not_upscaled() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("small.jpg");
        create_test_jpeg(&src, 400, 300);

        let req = request(&tmp, &src, vec![ImageFormat::Jpeg]);
        let meta = process_blocking(&req, false).unwrap();

        let jpeg = meta.get(ImageFormat::Jpeg).unwrap();
        assert_eq!(jpeg.len(), 1);
        assert_eq!(jpeg[0].filename, "small-400.jpeg");
        assert_eq!((jpeg[0].width, jpeg[0].height), (400, 300));
    }

    #[test]
    fn webp_and_avif_are_written() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 1000, 500);

        let req = request(&tmp, &src, vec![ImageFormat::Avif, ImageFormat::Webp]);
        process_blocking(&req, false).unwrap();

        assert!(tmp.path().join("out/photo-960.avif").exists());
        assert!(tmp.path().join("out/photo-960.webp").exists());
    }

    #[test]
    fn gif_is_copied_verbatim_when_animated() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("anim.gif");
        create_test_gif(&src, 64, 32);

        let mut req = request(&tmp, &src, vec![ImageFormat::Gif]);
        req.widths = vec![Width::Auto];
        req.filename = FilenameFormat::Passthrough;
        req.options.animated = true;
        let meta = process_blocking(&req, false).unwrap();

        let gif = meta.first(ImageFormat::Gif).unwrap();
        assert_eq!(gif.url, "/assets/images/anim.gif");
        assert_eq!(gif.status, VariantStatus::Passthrough);
        assert_eq!(
            std::fs::read(&src).unwrap(),
            std::fs::read(tmp.path().join("out/anim.gif")).unwrap()
        );
    }

    #[test]
    fn svg_is_copied_verbatim() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("logo.svg");
        write_test_svg(&src, 100, 50);

        let mut req = request(&tmp, &src, vec![ImageFormat::Svg]);
        req.widths = vec![Width::Auto];
        req.filename = FilenameFormat::Passthrough;
        let meta = process_blocking(&req, false).unwrap();

        let svg = meta.first(ImageFormat::Svg).unwrap();
        assert_eq!(svg.filename, "logo.svg");
        assert_eq!((svg.width, svg.height), (100, 50));
        assert_eq!(svg.source_type, "image/svg+xml");
        assert!(tmp.path().join("out/logo.svg").exists());
    }

    #[test]
    fn unsized_svg_is_still_copied() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("icon.svg");
        std::fs::write(&src, r#"<svg width="10em" height="5em"><path d="M0 0"/></svg>"#).unwrap();

        let mut req = request(&tmp, &src, vec![ImageFormat::Svg]);
        req.widths = vec![Width::Auto];
        req.filename = FilenameFormat::Passthrough;
        let meta = process_blocking(&req, true).unwrap();

        let svg = meta.first(ImageFormat::Svg).unwrap();
        assert_eq!(svg.status, VariantStatus::Passthrough);
        assert_eq!(svg.url, "/assets/images/icon.svg");
        assert_eq!(
            std::fs::read(&src).unwrap(),
            std::fs::read(tmp.path().join("out/icon.svg")).unwrap()
        );
    }

    #[test]
    fn passthrough_format_from_other_source_errors() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 100, 100);

        let req = request(&tmp, &src, vec![ImageFormat::Svg]);
        let err = process_blocking(&req, false).unwrap_err();
        assert!(matches!(err, BackendError::UnsupportedFormat(_)));
    }

    #[test]
    fn second_run_hits_cache() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 1000, 500);
        let req = request(&tmp, &src, vec![ImageFormat::Jpeg]);

        let first = process_blocking(&req, true).unwrap();
        assert_eq!(first.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Encoded);

        let second = process_blocking(&req, true).unwrap();
        assert_eq!(second.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Cached);
    }

    #[test]
    fn changed_quality_misses_cache() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 1000, 500);
        let mut req = request(&tmp, &src, vec![ImageFormat::Jpeg]);

        process_blocking(&req, true).unwrap();
        req.options.jpeg_quality = Quality::new(50);
        let meta = process_blocking(&req, true).unwrap();
        assert_eq!(meta.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Encoded);
    }

    #[test]
    fn uncached_run_replaces_manifest_entries() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 1000, 500);
        let out = tmp.path().join("out/photo-960.jpeg");
        let mut req = request(&tmp, &src, vec![ImageFormat::Jpeg]);

        process_blocking(&req, true).unwrap();
        req.options.jpeg_quality = Quality::new(5);
        process_blocking(&req, false).unwrap();
        let low_quality = std::fs::read(&out).unwrap();

        req.options.jpeg_quality = Quality::new(80);
        let meta = process_blocking(&req, true).unwrap();
        assert_eq!(meta.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Encoded);
        assert_ne!(std::fs::read(&out).unwrap(), low_quality);

        // and the quality-80 file is trusted again afterwards
        let meta = process_blocking(&req, true).unwrap();
        assert_eq!(meta.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Cached);
    }

    #[test]
    fn uncached_run_reencodes_everything() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        create_test_jpeg(&src, 1000, 500);
        let req = request(&tmp, &src, vec![ImageFormat::Jpeg]);

        process_blocking(&req, true).unwrap();
        let meta = process_blocking(&req, false).unwrap();
        assert_eq!(meta.first(ImageFormat::Jpeg).unwrap().status, VariantStatus::Encoded);
    }

    #[test]
    fn passthrough_write_forgets_encoded_entry() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("anim.gif");
        create_test_gif(&src, 64, 32);
        let mut req = request(&tmp, &src, vec![ImageFormat::Gif]);
        req.widths = vec![Width::Auto];
        req.filename = FilenameFormat::Passthrough;

        // a single-frame re-encode is recorded in the cache
        process_blocking(&req, true).unwrap();
        // the verbatim copy overwrites that file
        req.options.animated = true;
        process_blocking(&req, true).unwrap();

        req.options.animated = false;
        let meta = process_blocking(&req, true).unwrap();
        assert_eq!(meta.first(ImageFormat::Gif).unwrap().status, VariantStatus::Encoded);
    }

    #[test]
    fn missing_source_is_error() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp, &tmp.path().join("nope.png"), vec![ImageFormat::Jpeg]);
        assert!(process_blocking(&req, false).is_err());
    }

    #[tokio::test]
    async fn trait_call_runs_on_blocking_pool() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.png");
        create_test_png(&src, 1000, 500);

        let backend = RustBackend::new().with_cache(false);
        let meta = backend
            .process(&request(&tmp, &src, vec![ImageFormat::Jpeg]))
            .await
            .unwrap();
        assert_eq!(meta.first(ImageFormat::Jpeg).unwrap().width, 960);
    }
}
