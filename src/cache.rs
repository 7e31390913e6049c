//! Single-slot metadata cache.
//!
//! After every successful metadata fetch the raw metadata is written to one
//! well-known JSON file, replacing whatever was there. The cache is
//! write-only from this crate's side: nothing here reads it back, and a
//! failed write is logged and otherwise ignored. It exists for external
//! tools that want the last photo's metadata without an EXIF reader.
//!
//! ## Entry
//!
//! ```json
//! {
//!   "version": 1,
//!   "source": "/photos/DSC_0001.jpg",
//!   "source_hash": "9f86d08…",
//!   "metadata": { "camera_make": "\"NIKON CORPORATION\"", … }
//! }
//! ```
//!
//! `source_hash` is the SHA-256 of the source file so a reader can tell
//! whether the entry still describes the file at `source`. It is empty when
//! the source could not be read at store time.

use crate::config::CacheConfig;
use crate::metadata::ExifMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Version of the cache entry format, bumped when [`CachedMetadata`]
/// changes shape.
pub const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The one cached entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedMetadata {
    pub version: u32,
    pub source: PathBuf,
    pub source_hash: String,
    pub metadata: ExifMetadata,
}

#[derive(Debug, Clone)]
pub struct MetadataCache {
    path: PathBuf,
}

impl MetadataCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The configured cache, or `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.resolved_path()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with metadata for `source`.
    pub fn store(&self, source: &Path, metadata: &ExifMetadata) -> Result<(), CacheError> {
        let source_hash = hash_file(source).unwrap_or_else(|e| {
            tracing::debug!(source = %source.display(), error = %e, "could not hash source");
            String::new()
        });
        let entry = CachedMetadata {
            version: CACHE_VERSION,
            source: source.to_path_buf(),
            source_hash,
            metadata: metadata.clone(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&entry)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "cached metadata");
        Ok(())
    }
}

/// SHA-256 of a file's contents as lowercase hex.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}
