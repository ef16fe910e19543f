//! Configuration module.
//!
//! Handles loading, validating, and merging `respimg.toml`. Stock defaults
//! reproduce the conventional layout (`/assets/images/` URLs, files under
//! `./dist/assets/images/`, 960px and 1440px variants); a user file only
//! needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! url_path = "/assets/images/"        # Public URL prefix (must end with /)
//! output_dir = "./dist/assets/images/" # Where generated files are written
//!
//! [images]
//! widths = [960, 1440]     # Raster variant widths
//! sizes = "100vw"          # Default `sizes` attribute
//! jpeg_quality = 80        # Lossy quality for JPEG and AVIF (1-100)
//! use_cache = true         # Skip re-encoding unchanged sources
//!
//! [formats]
//! development = ["png", "jpeg"]
//! production = ["avif", "webp", "jpeg"]
//!
//! [markup]
//! caption_class = "img-post"   # css class that enables <figcaption>
//! border_color = "transparent" # Default --banner-border-color
//! picture_class = ""
//! css_class = ""
//! caption_html = false         # Emit captions as trusted HTML, unescaped
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::naming;
use crate::types::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config filename looked up in the working directory.
pub const CONFIG_FILENAME: &str = "respimg.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `respimg.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Public URL prefix for generated images.
    pub url_path: String,
    /// Filesystem directory generated images are written to.
    pub output_dir: String,
    pub images: ImagesConfig,
    pub formats: FormatsConfig,
    pub markup: MarkupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url_path: naming::DEFAULT_URL_PATH.to_string(),
            output_dir: "./dist/assets/images/".to_string(),
            images: ImagesConfig::default(),
            formats: FormatsConfig::default(),
            markup: MarkupConfig::default(),
        }
    }
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url_path.ends_with('/') {
            return Err(ConfigError::Validation("url_path must end with '/'".into()));
        }
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths values must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(ConfigError::Validation(
                "images.jpeg_quality must be 1-100".into(),
            ));
        }
        for (name, set) in [
            ("development", &self.formats.development),
            ("production", &self.formats.production),
        ] {
            if !set.contains(&ImageFormat::Jpeg) {
                return Err(ConfigError::Validation(format!(
                    "formats.{name} must include jpeg (used for the fallback <img>)"
                )));
            }
            if let Some(f) = set.iter().find(|f| f.is_passthrough()) {
                return Err(ConfigError::Validation(format!(
                    "formats.{name} cannot contain {f}: it is passthrough-only"
                )));
            }
        }
        Ok(())
    }
}

/// Raster variant generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub widths: Vec<u32>,
    /// Default `sizes` attribute when the caller gives none.
    pub sizes: String,
    pub jpeg_quality: u32,
    pub use_cache: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![960, 1440],
            sizes: "100vw".to_string(),
            jpeg_quality: 80,
            use_cache: true,
        }
    }
}

/// Raster output format sets per build environment, in `<source>` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatsConfig {
    pub development: Vec<ImageFormat>,
    pub production: Vec<ImageFormat>,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            development: vec![ImageFormat::Png, ImageFormat::Jpeg],
            production: vec![ImageFormat::Avif, ImageFormat::Webp, ImageFormat::Jpeg],
        }
    }
}

/// Markup defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkupConfig {
    /// `<figcaption>` is only emitted when the image's css class equals this.
    pub caption_class: String,
    pub border_color: String,
    pub picture_class: String,
    pub css_class: String,
    /// Captions are author-written HTML and are emitted without escaping.
    pub caption_html: bool,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            caption_class: "img-post".to_string(),
            border_color: "transparent".to_string(),
            picture_class: String::new(),
            css_class: String::new(),
            caption_html: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(Config::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value. `Ok(None)` if it doesn't exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file path, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `respimg.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# respimg configuration
# =====================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Public URL prefix for generated images. Must end with "/".
url_path = "/assets/images/"

# Directory generated images are written to.
output_dir = "./dist/assets/images/"

# ---------------------------------------------------------------------------
# Raster variants
# ---------------------------------------------------------------------------
[images]
# Pixel widths to generate. Widths larger than the source become the source width.
widths = [960, 1440]

# Default `sizes` attribute on <source> elements.
sizes = "100vw"

# Lossy encoding quality for JPEG and AVIF (1 = worst, 100 = best).
jpeg_quality = 80

# Reuse previously encoded files when source and settings are unchanged.
use_cache = true

# ---------------------------------------------------------------------------
# Output formats, in <source> order. Both sets must include jpeg.
# ---------------------------------------------------------------------------
[formats]
development = ["png", "jpeg"]
production = ["avif", "webp", "jpeg"]

# ---------------------------------------------------------------------------
# Markup defaults
# ---------------------------------------------------------------------------
[markup]
# <figcaption> is rendered only for images with exactly this css class.
caption_class = "img-post"
border_color = "transparent"
picture_class = ""
css_class = ""
# Captions are escaped; set to true to allow links and other inline HTML.
caption_html = false
"##
}
