//! A cached lookup result for one DOI.

use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::parser::Doi;
use crate::sources::{MetadataRecord, OpenAccessResult};

/// Everything learned about a DOI in a previous run.
///
/// `metadata: None` records a Crossref "not found"; `oa_result: None` means
/// the open-access lookup has not succeeded yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The DOI this entry describes.
    pub doi: Doi,
    /// Crossref metadata.
    pub metadata: Option<MetadataRecord>,
    /// Unpaywall result.
    pub oa_result: Option<OpenAccessResult>,
    /// Where the PDF was saved, once downloaded.
    pub local_pdf_path: Option<PathBuf>,
    /// When the entry was written.
    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        doi: Doi,
        metadata: Option<MetadataRecord>,
        oa_result: Option<OpenAccessResult>,
        local_pdf_path: Option<PathBuf>,
    ) -> Self {
        Self {
            doi,
            metadata,
            oa_result,
            local_pdf_path,
            fetched_at: Utc::now(),
        }
    }

    /// Whether the entry is still usable at `now` under `ttl` (`None` = never expires).
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Option<Duration>) -> bool {
        ttl.is_none_or(|ttl| now.signed_duration_since(self.fetched_at) <= ttl)
    }
}
