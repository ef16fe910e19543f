//! Encoding cache for repeated builds.
//!
//! Re-encoding every raster variant on every page build is the slowest part
//! of rendering. [`RustBackend`](super::RustBackend) consults this cache
//! before encoding and skips work when the source bytes and encoding
//! parameters haven't changed since the last run.
//!
//! ## Cache keys
//!
//! Lookups are content-addressed by `source_hash` + `params_hash`, not by
//! output filename:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Survives
//!   `git checkout` resetting modification times.
//! - **`params_hash`**: SHA-256 of (format, width, quality, animated).
//!
//! A hit also requires the previously written file to still exist. When the
//! same content was stored under another filename (source renamed), the old
//! file is copied to the new name instead of re-encoding.
//!
//! Runs with the cache disabled skip lookups but still record every file
//! they encode, and verbatim copies remove their entry, so the manifest
//! always describes what is on disk.
//!
//! ## Storage
//!
//! `.respimg-cache.json` inside the output directory, next to the images it
//! describes.

use crate::types::ImageFormat;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".respimg-cache.json";

/// Bump to invalidate existing caches when key computation changes.
const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping output filenames to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → filename. Rebuilt on load.
    #[serde(skip)]
    content_index: HashMap<String, String>,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// The expected file is already on disk.
    Hit,
    /// Same content exists under another filename.
    Moved(String),
    Miss,
}

impl CacheManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            content_index: HashMap::new(),
        }
    }

    /// Load from the output directory. Missing, corrupt, or outdated
    /// manifests load as empty.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "discarding unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.content_index = build_content_index(&manifest.entries);
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(output_dir.join(MANIFEST_FILENAME), json)
    }

    /// Look up `filename` by content hashes.
    pub fn lookup(
        &self,
        filename: &str,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> CacheLookup {
        let content_key = format!("{source_hash}:{params_hash}");
        let Some(stored) = self.content_index.get(&content_key) else {
            return CacheLookup::Miss;
        };
        if !output_dir.join(stored).exists() {
            return CacheLookup::Miss;
        }
        if stored == filename {
            CacheLookup::Hit
        } else {
            CacheLookup::Moved(stored.clone())
        }
    }

    /// Record an output file. A previous entry for the same content under a
    /// different filename is dropped, as is whatever was recorded for this
    /// filename before.
    pub fn insert(&mut self, filename: String, source_hash: String, params_hash: String) {
        let content_key = format!("{source_hash}:{params_hash}");
        self.remove(&filename);

        if let Some(old) = self.content_index.get(&content_key)
            && *old != filename
        {
            self.entries.remove(old.as_str());
        }

        self.content_index.insert(content_key, filename.clone());
        self.entries.insert(
            filename,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }

    /// Forget `filename`. Used when a file is written without going through
    /// the cache, so its old entry no longer describes its contents.
    pub fn remove(&mut self, filename: &str) {
        let Some(entry) = self.entries.remove(filename) else {
            return;
        };
        let content_key = format!("{}:{}", entry.source_hash, entry.params_hash);
        if self.content_index.get(&content_key).is_some_and(|f| f == filename) {
            self.content_index.remove(&content_key);
        }
    }
}

fn build_content_index(entries: &HashMap<String, CacheEntry>) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(filename, entry)| {
            let content_key = format!("{}:{}", entry.source_hash, entry.params_hash);
            (content_key, filename.clone())
        })
        .collect()
}

/// SHA-256 of a byte slice as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 of the parameters that determine one encoded variant.
pub fn hash_variant_params(format: ImageFormat, width: u32, quality: u32, animated: bool) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"variant\0");
    hasher.update(format.as_str().as_bytes());
    hasher.update(b"\0");
    hasher.update(width.to_le_bytes());
    hasher.update(quality.to_le_bytes());
    hasher.update([animated as u8]);
    format!("{:x}", hasher.finalize())
}
