//! # respimg
//!
//! Responsive image helpers for static-site build pipelines. Two things
//! live here:
//!
//! - [`naming::img_size`] computes the public URL of a generated image from
//!   its source path, a width token, and a format token.
//! - [`render::render_image`] generates the image variants through an
//!   [`imaging::ImageBackend`] and returns `<figure>`/`<picture>` markup that
//!   references them.
//!
//! ```text
//! photo.png ──▶ render_image ──▶ ImageBackend ──▶ dist/assets/images/photo-960.jpeg …
//!                    │
//!                    └──────────▶ <figure><picture><source …><img …></picture></figure>
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | The one output naming rule, plus `img_size` URL helpers |
//! | [`render`] | Markup for gif, svg, and raster sources |
//! | [`imaging`] | Backend trait, `image`-crate backend, encoding cache |
//! | [`config`] | `respimg.toml` loading, merging, and validation |
//! | [`types`] | Formats, asset kinds, widths, build environment |
//! | [`output`] | CLI summary formatting |
//! | [`logging`] | `tracing` subscriber setup for the CLI |
//!
//! # Design Decisions
//!
//! ## One Naming Rule
//!
//! Templates often link an image URL directly (`img_size("hero.png")`)
//! instead of going through the renderer. Those links only work if the URL
//! helper and the backend agree on filenames, so both call
//! [`naming::output_filename`]. There is no second copy of the pattern to
//! drift.
//!
//! ## Environment Is a Parameter
//!
//! Development builds emit PNG and JPEG (fast to encode); production builds
//! emit AVIF, WebP, and JPEG. The library never reads the process
//! environment to decide: callers pass an [`types::Environment`] inside
//! [`render::RenderOptions`]. Only the CLI maps `RESPIMG_ENV` onto it.
//!
//! ## Maud Over String Templates
//!
//! Markup is built with [Maud](https://maud.lambda.xyz/). Alt text and
//! captions come from content authors, and maud escapes every interpolated
//! value, so a stray quote in an alt attribute can't break the page.
//!
//! ## Backends Behind a Trait
//!
//! The renderer only sees [`imaging::ImageBackend`]. The production
//! [`imaging::RustBackend`] is pure Rust (`image` + rav1e), and the test
//! suite swaps in a recording mock so markup logic is tested without
//! encoding a single pixel.

pub mod config;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod render;
pub mod types;

pub use naming::{img_size, img_size_with};
pub use render::{ImageRequest, RenderError, RenderOptions, render_image};

#[cfg(test)]
pub(crate) mod test_helpers;
