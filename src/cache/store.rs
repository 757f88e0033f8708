//! JSON-file backed DOI cache.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::entry::CacheEntry;
use crate::atomic_file::write_atomic;
use crate::parser::{Doi, normalize_key};

/// On-disk format version.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Non-fatal problems found while loading the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheWarning {
    /// No cache file yet; starting empty.
    #[error("cache file {path} does not exist yet; starting with an empty cache")]
    Missing {
        /// Expected cache location.
        path: PathBuf,
    },

    /// The file could not be read or parsed; it will be replaced on flush.
    #[error("cache file {path} is unreadable ({reason}); starting with an empty cache")]
    Corrupted {
        /// Cache location.
        path: PathBuf,
        /// Read or parse failure.
        reason: String,
    },
}

/// Errors from persisting the cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Writing the cache file failed.
    #[error("failed to write cache file {path}: {source}")]
    Io {
        /// Cache location.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing entries failed.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// DOI → [`CacheEntry`] map persisted as one JSON document.
///
/// Keys are normalized DOI keys, so `get("10.1000/ABC")` finds an entry
/// stored under `10.1000/abc`.
#[derive(Debug, Default)]
pub struct Cache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
    ttl: Option<Duration>,
    warnings: Vec<CacheWarning>,
}

impl Cache {
    /// Loads the cache at `path`. Never fails: a missing or malformed file
    /// gives an empty cache plus a [`CacheWarning`].
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut cache = Self {
            path: Some(path.clone()),
            ..Self::default()
        };

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no cache file yet");
                cache.warnings.push(CacheWarning::Missing { path });
                return cache;
            }
            Err(e) => {
                warn!(error = %e, "cache file unreadable, starting empty");
                cache.warnings.push(CacheWarning::Corrupted {
                    path,
                    reason: e.to_string(),
                });
                return cache;
            }
        };

        match parse_cache_file(&raw) {
            Ok(entries) => {
                info!(entries = entries.len(), "cache loaded");
                cache.entries = entries;
            }
            Err(reason) => {
                warn!(%reason, "cache file corrupted, starting empty");
                cache.warnings.push(CacheWarning::Corrupted { path, reason });
            }
        }
        cache
    }

    /// A cache that is never read from or written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Sets the freshness limit used by [`get_fresh`](Self::get_fresh).
    #[must_use]
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    /// Looks up a DOI (any spelling or prefix form).
    #[must_use]
    pub fn get(&self, doi: &str) -> Option<&CacheEntry> {
        self.entries.get(&normalize_key(doi))
    }

    /// Looks up a parsed DOI by its key, ignoring entries older than the TTL.
    #[must_use]
    pub fn get_fresh(&self, doi: &Doi, now: DateTime<Utc>) -> Option<&CacheEntry> {
        self.entries.get(doi.key()).filter(|entry| {
            let fresh = entry.is_fresh(now, self.ttl);
            if !fresh {
                debug!(doi = doi.as_str(), fetched_at = %entry.fetched_at, "cache entry expired");
            }
            fresh
        })
    }

    /// Inserts or replaces the entry for `entry.doi`.
    pub fn put(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.doi.key().to_string(), entry);
    }

    /// Writes the cache to disk atomically. No-op for in-memory caches.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if serialization or the file write fails; the
    /// previous file is left intact in that case.
    #[instrument(skip(self), fields(entries = self.entries.len()))]
    pub fn flush(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&file).map_err(CacheError::Serialize)?;
        write_atomic(path, &json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "cache flushed");
        Ok(())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Problems found while loading.
    #[must_use]
    pub fn warnings(&self) -> &[CacheWarning] {
        &self.warnings
    }
}

fn parse_cache_file(raw: &str) -> Result<BTreeMap<String, CacheEntry>, String> {
    let file: CacheFile = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if file.version != CACHE_FORMAT_VERSION {
        return Err(format!("unsupported cache format version {}", file.version));
    }
    // Re-key in case the file was edited by hand.
    Ok(file
        .entries
        .into_values()
        .map(|entry| (entry.doi.key().to_string(), entry))
        .collect())
}
