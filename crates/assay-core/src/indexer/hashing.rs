use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use assay_schema::Sha256Digest;
use chrono::{DateTime, Utc};

/// A single cached hash entry persisted to disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CachedEntry {
    /// The hex-encoded SHA-256 digest.
    pub hash: String,
    /// When this entry was computed.
    pub timestamp: DateTime<Utc>,
}

/// Persistent on-disk cache mapping download URLs to their computed digests.
///
/// Only direct computation reads and fills the cache: provided digests and
/// sibling checksum files are already cheap. Serialized as JSON under
/// `$ASSAY_HOME/cache/hashes.json`.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct HashCache {
    /// Map of download URL to its [`CachedEntry`].
    pub entries: HashMap<String, CachedEntry>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl HashCache {
    /// Load the hash cache from `path`.
    ///
    /// Returns an empty cache bound to `path` if the file does not exist or
    /// cannot be parsed.
    pub fn load(path: &Path) -> Self {
        let mut cache = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str::<Self>(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring corrupt hash cache {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        cache.path = Some(path.to_path_buf());
        cache
    }

    /// Persist the cache to the path it was loaded from.
    ///
    /// In-memory caches (created with [`HashCache::default`]) are not written.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created, the cache
    /// cannot be serialized, or the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Look up the cached digest for the given URL.
    ///
    /// Entries whose hash is not a valid SHA-256 digest are ignored.
    pub fn get(&self, url: &str) -> Option<Sha256Digest> {
        let entry = self.entries.get(url)?;
        Sha256Digest::new(&entry.hash).ok()
    }

    /// Insert or update the digest for the given URL.
    pub fn insert(&mut self, url: String, digest: &Sha256Digest) {
        self.entries.insert(
            url,
            CachedEntry {
                hash: digest.as_str().to_string(),
                timestamp: Utc::now(),
            },
        );
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
