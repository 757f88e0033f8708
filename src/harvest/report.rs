//! JSON run report: one row per DOI plus the batch summary.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::outcome::{BatchReport, BatchSummary, HarvestOutcome, HarvestStatus};
use crate::atomic_file::write_atomic;

/// Default report file name inside the output directory.
pub const DEFAULT_REPORT_FILE: &str = "report.json";

/// Errors from writing the report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serializing the report failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Writing the report file failed.
    #[error("failed to write report {path}: {source}")]
    Io {
        /// Report location.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// One report row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub doi: String,
    pub status: HarvestStatus,
    pub detail: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub is_oa: Option<bool>,
    pub oa_status: Option<String>,
    pub license: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_path: Option<PathBuf>,
    pub from_cache: bool,
}

impl From<&HarvestOutcome> for ReportRow {
    fn from(outcome: &HarvestOutcome) -> Self {
        let metadata = outcome.metadata.as_ref();
        let oa = outcome.open_access.as_ref();
        Self {
            doi: outcome.doi.clone(),
            status: outcome.status,
            detail: outcome.detail.clone(),
            title: metadata.and_then(|m| m.title.clone()),
            journal: metadata.and_then(|m| m.journal.clone()),
            year: metadata.and_then(|m| m.year),
            authors: metadata.map(|m| m.authors.clone()).unwrap_or_default(),
            publisher: metadata.and_then(|m| m.publisher.clone()),
            is_oa: oa.map(|o| o.is_open_access),
            oa_status: oa.and_then(|o| o.oa_status.clone()),
            license: oa.and_then(|o| o.license.clone()),
            pdf_url: oa.and_then(|o| o.pdf_url.clone()),
            pdf_path: outcome.pdf_path.clone(),
            from_cache: outcome.from_cache,
        }
    }
}

/// The serialized report document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub summary: BatchSummary,
    pub rows: Vec<ReportRow>,
}

impl RunReport {
    /// Builds the document for a finished batch, stamped `generated_at`.
    #[must_use]
    pub fn new(batch: &BatchReport, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            summary: batch.summary(),
            rows: batch.outcomes.iter().map(ReportRow::from).collect(),
        }
    }

    /// Writes the report as pretty JSON, atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] if serialization or the write fails.
    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_vec_pretty(self).map_err(ReportError::Serialize)?;
        write_atomic(path, &json).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), rows = self.rows.len(), "report written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::parser::Doi;
    use crate::sources::{MetadataRecord, OpenAccessResult};
    use tempfile::TempDir;

    fn found_outcome() -> HarvestOutcome {
        let doi = Doi::parse("10.1000/a").unwrap();
        let mut metadata = MetadataRecord::new(doi.clone());
        metadata.title = Some("A Paper".to_string());
        metadata.authors = vec!["Ada Lovelace".to_string()];
        metadata.year = Some(1843);
        let oa = OpenAccessResult {
            is_open_access: true,
            pdf_url: Some("https://x.org/a.pdf".to_string()),
            license: Some("cc-by".to_string()),
            oa_status: Some("gold".to_string()),
            ..OpenAccessResult::closed(doi)
        };
        HarvestOutcome::new("10.1000/a", HarvestStatus::Found)
            .with_pdf_path("/out/10.1000_a.pdf")
            .with_records(Some(metadata), Some(oa))
    }

    #[test]
    fn test_row_flattens_metadata_and_oa() {
        let row = ReportRow::from(&found_outcome());
        assert_eq!(row.title.as_deref(), Some("A Paper"));
        assert_eq!(row.year, Some(1843));
        assert_eq!(row.authors, vec!["Ada Lovelace"]);
        assert_eq!(row.is_oa, Some(true));
        assert_eq!(row.license.as_deref(), Some("cc-by"));
        assert_eq!(row.pdf_path, Some(PathBuf::from("/out/10.1000_a.pdf")));
    }

    #[test]
    fn test_row_without_records_is_sparse() {
        let outcome = HarvestOutcome::new("bad", HarvestStatus::Error).with_detail("invalid DOI");
        let row = ReportRow::from(&outcome);
        assert_eq!(row.title, None);
        assert!(row.authors.is_empty());
        assert_eq!(row.is_oa, None);
        assert_eq!(row.detail.as_deref(), Some("invalid DOI"));
    }

    #[test]
    fn test_write_produces_expected_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/report.json");
        let batch = BatchReport::new(vec![
            found_outcome(),
            HarvestOutcome::new("10.1000/b", HarvestStatus::NotFound).cached(true),
        ]);

        RunReport::new(&batch, Utc::now()).write(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["summary"]["total"], 2);
        assert_eq!(json["summary"]["found"], 1);
        assert_eq!(json["rows"][0]["status"], "FOUND");
        assert_eq!(json["rows"][0]["oa_status"], "gold");
        assert_eq!(json["rows"][1]["status"], "NOT_FOUND");
        assert_eq!(json["rows"][1]["from_cache"], true);
        assert!(json["generated_at"].is_string());
    }
}
