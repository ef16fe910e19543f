//! Responsive image markup.
//!
//! [`render_image`] turns one source image into a `<figure>` fragment for
//! embedding in a page. It asks an [`ImageBackend`] to produce the files,
//! then builds the markup from what the backend reports.
//!
//! ## Branches
//!
//! | Source | Request | Markup |
//! |---|---|---|
//! | `.gif` | width `auto`, format `gif`, animated | `<figure><img>` |
//! | `.svg` | width `auto`, format `svg` | `<figure><img style=…>` |
//! | anything else | configured widths × environment formats | `<figure><picture><source>…<img>` |
//!
//! Every branch puts `--banner-border-color` on the figure, lazy-loads and
//! async-decodes the `<img>`, and adds a `<figcaption>` only when a caption
//! is given *and* the image's css class equals the caption marker
//! (`img-post` by default).
//!
//! Output is generated with maud, so every interpolated value is escaped.
//! Captions are the one exception, and only when `caption_html` is set.

use crate::config::Config;
use crate::imaging::{
    BackendError, EncoderOptions, FilenameFormat, ImageBackend, ImageMetadata, OutputLayout,
    ProcessRequest, ProcessedVariant, Quality,
};
use crate::types::{AssetKind, Environment, ImageFormat, Width};
use maud::{Markup, PreEscaped, html};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Inline style that keeps vector art legible on any page background.
const SVG_IMG_STYLE: &str = "padding: 10px;background-color: #fff;";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Missing `alt` on responsive image from: {src}")]
    MissingAlt { src: String },
    #[error("No jpeg variant generated for {src}; the fallback <img> needs one")]
    MissingFallback { src: String },
    #[error("No {format} output generated for {src}")]
    MissingOutput { src: String, format: ImageFormat },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One image to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub source: PathBuf,
    /// `None` is an error; `Some("")` marks a decorative image.
    pub alt: Option<String>,
    pub sizes: String,
    pub picture_class: String,
    pub css_class: String,
    pub border_color: String,
    pub caption: Option<String>,
}

impl ImageRequest {
    pub fn new(source: impl Into<PathBuf>, alt: Option<&str>) -> Self {
        Self {
            source: source.into(),
            alt: alt.map(str::to_string),
            sizes: "100vw".to_string(),
            picture_class: String::new(),
            css_class: String::new(),
            border_color: "transparent".to_string(),
            caption: None,
        }
    }

    pub fn sizes(mut self, sizes: impl Into<String>) -> Self {
        self.sizes = sizes.into();
        self
    }

    pub fn picture_class(mut self, class: impl Into<String>) -> Self {
        self.picture_class = class.into();
        self
    }

    pub fn css_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = class.into();
        self
    }

    pub fn border_color(mut self, color: impl Into<String>) -> Self {
        self.border_color = color.into();
        self
    }

    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Build-wide rendering settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub environment: Environment,
    pub layout: OutputLayout,
    pub widths: Vec<u32>,
    pub development_formats: Vec<ImageFormat>,
    pub production_formats: Vec<ImageFormat>,
    pub jpeg_quality: Quality,
    pub caption_class: String,
    /// Emit captions unescaped.
    pub caption_html: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&Config::default(), Environment::default())
    }
}

impl RenderOptions {
    pub fn from_config(config: &Config, environment: Environment) -> Self {
        Self {
            environment,
            layout: OutputLayout {
                url_path: config.url_path.clone(),
                output_dir: PathBuf::from(&config.output_dir),
            },
            widths: config.images.widths.clone(),
            development_formats: config.formats.development.clone(),
            production_formats: config.formats.production.clone(),
            jpeg_quality: Quality::new(config.images.jpeg_quality),
            caption_class: config.markup.caption_class.clone(),
            caption_html: config.markup.caption_html,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Raster formats for the active environment, in `<source>` order.
    pub fn raster_formats(&self) -> &[ImageFormat] {
        match self.environment {
            Environment::Development => &self.development_formats,
            Environment::Production => &self.production_formats,
        }
    }
}

/// Build the backend request for a source of the given kind.
pub fn plan_request(source: &Path, kind: AssetKind, options: &RenderOptions) -> ProcessRequest {
    let (widths, formats, filename, animated) = match kind {
        AssetKind::Gif => (
            vec![Width::Auto],
            vec![ImageFormat::Gif],
            FilenameFormat::Passthrough,
            true,
        ),
        AssetKind::Svg => (
            vec![Width::Auto],
            vec![ImageFormat::Svg],
            FilenameFormat::Passthrough,
            false,
        ),
        AssetKind::Raster => (
            options.widths.iter().map(|&w| Width::Px(w)).collect(),
            options.raster_formats().to_vec(),
            FilenameFormat::Sized,
            false,
        ),
    };
    ProcessRequest {
        source: source.to_path_buf(),
        widths,
        formats,
        layout: options.layout.clone(),
        filename,
        options: EncoderOptions {
            jpeg_quality: options.jpeg_quality,
            animated,
        },
    }
}

/// Render a responsive image fragment.
///
/// Fails with [`RenderError::MissingAlt`] before any processing when
/// `request.alt` is `None`. Backend failures propagate unchanged.
pub async fn render_image(
    backend: &impl ImageBackend,
    request: &ImageRequest,
    options: &RenderOptions,
) -> Result<String, RenderError> {
    render_with_metadata(backend, request, options)
        .await
        .map(|rendered| rendered.markup.into_string())
}

/// Markup together with what the backend generated for it.
#[derive(Debug)]
pub struct RenderedImage {
    pub markup: Markup,
    pub metadata: ImageMetadata,
}

/// Like [`render_image`] but keeps the maud [`Markup`] for further
/// composition and returns the backend's variant report.
pub async fn render_with_metadata(
    backend: &impl ImageBackend,
    request: &ImageRequest,
    options: &RenderOptions,
) -> Result<RenderedImage, RenderError> {
    let src = request.source.display().to_string();
    let Some(alt) = request.alt.as_deref() else {
        return Err(RenderError::MissingAlt { src });
    };

    let kind = AssetKind::from_path(&request.source);
    tracing::debug!(%src, ?kind, environment = options.environment.as_str(), "rendering image");

    let plan = plan_request(&request.source, kind, options);
    let metadata = backend.process(&plan).await?;

    let caption = caption_markup(
        visible_caption(request, &options.caption_class),
        options.caption_html,
    );
    let markup = match kind {
        AssetKind::Gif | AssetKind::Svg => {
            let format = plan.formats[0];
            let image = metadata
                .first(format)
                .ok_or(RenderError::MissingOutput { src, format })?;
            let style = (kind == AssetKind::Svg).then_some(SVG_IMG_STYLE);
            single_image_figure(request, alt, image, style, caption)
        }
        AssetKind::Raster => {
            let lowsrc = metadata
                .first(ImageFormat::Jpeg)
                .ok_or(RenderError::MissingFallback { src })?;
            picture_figure(request, alt, &metadata, lowsrc, caption)
        }
    };
    Ok(RenderedImage { markup, metadata })
}

/// The caption text if it should be displayed.
fn visible_caption<'a>(request: &'a ImageRequest, caption_class: &str) -> Option<&'a str> {
    request
        .caption
        .as_deref()
        .filter(|c| !c.is_empty() && request.css_class == caption_class)
}

fn banner_style(request: &ImageRequest) -> String {
    format!("--banner-border-color: {}", request.border_color)
}

fn caption_markup(caption: Option<&str>, as_html: bool) -> Markup {
    html! {
        @if let Some(caption) = caption {
            @if as_html {
                figcaption { (PreEscaped(caption)) }
            } @else {
                figcaption { (caption) }
            }
        }
    }
}

fn single_image_figure(
    request: &ImageRequest,
    alt: &str,
    image: &ProcessedVariant,
    style: Option<&str>,
    caption: Markup,
) -> Markup {
    html! {
        figure class=(request.picture_class) style=(banner_style(request)) {
            img class=(request.css_class)
                src=(image.url)
                alt=(alt)
                loading="lazy"
                decoding="async"
                style=[style];
            (caption)
        }
    }
}

fn picture_figure(
    request: &ImageRequest,
    alt: &str,
    metadata: &ImageMetadata,
    lowsrc: &ProcessedVariant,
    caption: Markup,
) -> Markup {
    html! {
        figure class=(request.picture_class) style=(banner_style(request)) {
            picture {
                @for group in metadata.groups() {
                    source type=(group.source_type()) srcset=(group.srcset()) sizes=(request.sizes);
                }
                img class=(request.css_class)
                    src=(lowsrc.url)
                    width=(lowsrc.width)
                    height=(lowsrc.height)
                    alt=(alt)
                    loading="lazy"
                    decoding="async";
            }
            (caption)
        }
    }
}
