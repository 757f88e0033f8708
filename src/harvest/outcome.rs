//! Per-DOI outcomes and batch aggregation.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sources::{MetadataRecord, OpenAccessResult};

/// Terminal status of one DOI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarvestStatus {
    /// PDF saved (or would be, in dry-run mode).
    Found,
    /// DOI exists but no open-access PDF is available.
    NotOpenAccess,
    /// Crossref does not know the DOI.
    NotFound,
    /// Invalid input or an unexpected failure.
    Error,
}

impl HarvestStatus {
    /// Upper-case label used in output and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Found => "FOUND",
            Self::NotOpenAccess => "NOT_OPEN_ACCESS",
            Self::NotFound => "NOT_FOUND",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for HarvestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one input DOI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestOutcome {
    /// The DOI as given (normalized when it parsed).
    pub doi: String,
    /// Terminal status.
    pub status: HarvestStatus,
    /// Human-readable explanation.
    pub detail: Option<String>,
    /// Saved PDF, for `FOUND`.
    pub pdf_path: Option<PathBuf>,
    /// True when no Crossref or Unpaywall call was needed.
    pub from_cache: bool,
    /// Metadata known for the DOI, for reporting.
    pub metadata: Option<MetadataRecord>,
    /// Open-access result known for the DOI, for reporting.
    pub open_access: Option<OpenAccessResult>,
}

impl HarvestOutcome {
    /// Creates an outcome with no detail, path or records.
    #[must_use]
    pub fn new(doi: impl Into<String>, status: HarvestStatus) -> Self {
        Self {
            doi: doi.into(),
            status,
            detail: None,
            pdf_path: None,
            from_cache: false,
            metadata: None,
            open_access: None,
        }
    }

    /// Sets the detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the saved PDF path.
    #[must_use]
    pub fn with_pdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pdf_path = Some(path.into());
        self
    }

    /// Marks the outcome as served from the cache.
    #[must_use]
    pub fn cached(mut self, from_cache: bool) -> Self {
        self.from_cache = from_cache;
        self
    }

    /// Attaches the lookup results.
    #[must_use]
    pub fn with_records(
        mut self,
        metadata: Option<MetadataRecord>,
        open_access: Option<OpenAccessResult>,
    ) -> Self {
        self.metadata = metadata;
        self.open_access = open_access;
        self
    }
}

/// Counts per status for a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// DOIs processed.
    pub total: usize,
    /// `FOUND` outcomes.
    pub found: usize,
    /// `NOT_OPEN_ACCESS` outcomes.
    pub not_open_access: usize,
    /// `NOT_FOUND` outcomes.
    pub not_found: usize,
    /// `ERROR` outcomes.
    pub errors: usize,
    /// Outcomes answered from the cache.
    pub from_cache: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed: {} found, {} not open access, {} not found, {} errors ({} from cache)",
            self.total,
            self.found,
            self.not_open_access,
            self.not_found,
            self.errors,
            self.from_cache
        )
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One outcome per input, same order as the input.
    pub outcomes: Vec<HarvestOutcome>,
}

impl BatchReport {
    /// Wraps a list of outcomes.
    #[must_use]
    pub fn new(outcomes: Vec<HarvestOutcome>) -> Self {
        Self { outcomes }
    }

    /// Aggregate counts.
    #[must_use]
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary {
            total: self.outcomes.len(),
            ..BatchSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.status {
                HarvestStatus::Found => summary.found += 1,
                HarvestStatus::NotOpenAccess => summary.not_open_access += 1,
                HarvestStatus::NotFound => summary.not_found += 1,
                HarvestStatus::Error => summary.errors += 1,
            }
            if outcome.from_cache {
                summary.from_cache += 1;
            }
        }
        summary
    }

    /// True if any DOI ended in `ERROR`.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.status == HarvestStatus::Error)
    }

    /// Process exit code: 0 when no DOI ended in `ERROR`, else 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        u8::from(self.has_errors())
    }
}
