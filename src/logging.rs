//! Structured logging setup for the CLI.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! binary's job. Logs go to stderr so stdout carries nothing but the
//! rendered markup or URL and can be piped into a template.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "respimg=info" } else { "warn" }
}

/// Initialize the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects between
/// warnings only and `info` for this crate.
pub fn init_subscriber(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}
