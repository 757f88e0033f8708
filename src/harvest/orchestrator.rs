//! Per-DOI pipeline: cache → Crossref → Unpaywall → PDF download.
//!
//! The [`Harvester`] owns the [`Cache`] and borrows its collaborators through
//! trait objects, so the same pipeline runs against live services in the
//! binary and against fakes in tests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use super::outcome::{BatchReport, HarvestOutcome, HarvestStatus};
use crate::cache::{Cache, CacheEntry};
use crate::download::{DownloadError, PdfFetcher, has_pdf_magic, pdf_path_for_doi};
use crate::parser::Doi;
use crate::sources::{MetadataRecord, MetadataSource, OpenAccessResult, OpenAccessSource};

const DETAIL_NOT_FOUND: &str = "DOI not found in Crossref";
const DETAIL_NOT_OA: &str = "no open-access PDF available";

/// Pipeline state of a single DOI, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestState {
    /// Not started.
    Pending,
    /// Answered (at least partly) from the cache.
    Cached,
    /// Crossref metadata retrieved.
    MetadataFetched,
    /// Unpaywall answered.
    OaChecked,
    /// PDF transfer in progress.
    Downloading,
    /// Reached a non-error outcome.
    Done,
    /// Reached `ERROR`.
    Failed,
}

impl fmt::Display for HarvestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Cached => "CACHED",
            Self::MetadataFetched => "METADATA_FETCHED",
            Self::OaChecked => "OA_CHECKED",
            Self::Downloading => "DOWNLOADING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
        };
        f.write_str(label)
    }
}

/// Run-wide switches for the harvester.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    /// Where PDFs are written.
    pub output_dir: PathBuf,
    /// Overwrite existing PDFs.
    pub force: bool,
    /// Ignore cached entries when reading (still writes fresh ones).
    pub refresh: bool,
    /// Do lookups but skip the PDF download.
    pub dry_run: bool,
}

impl HarvestOptions {
    /// Options with every switch off.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            force: false,
            refresh: false,
            dry_run: false,
        }
    }
}

/// What a cached entry lets us skip.
enum CachedStep {
    /// The entry fully answers the DOI.
    Outcome(HarvestOutcome),
    /// Metadata is known; the open-access lookup still has to run.
    CheckOpenAccess(MetadataRecord),
    /// Lookups are known; only the download is missing.
    Download(MetadataRecord, OpenAccessResult),
}

/// Sequential DOI harvester.
pub struct Harvester {
    metadata: Arc<dyn MetadataSource>,
    open_access: Arc<dyn OpenAccessSource>,
    fetcher: Arc<dyn PdfFetcher>,
    cache: Cache,
    options: HarvestOptions,
}

impl fmt::Debug for Harvester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harvester")
            .field("cache_entries", &self.cache.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Assembles a harvester from its collaborators.
    #[must_use]
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        open_access: Arc<dyn OpenAccessSource>,
        fetcher: Arc<dyn PdfFetcher>,
        cache: Cache,
        options: HarvestOptions,
    ) -> Self {
        Self {
            metadata,
            open_access,
            fetcher,
            cache,
            options,
        }
    }

    /// The cache as it stands.
    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Gives the cache back, e.g. to inspect it after a batch.
    #[must_use]
    pub fn into_cache(self) -> Cache {
        self.cache
    }

    /// Processes DOIs in order; one DOI's failure never stops the batch.
    pub async fn run_batch(&mut self, inputs: &[String]) -> BatchReport {
        self.run_batch_with_progress(inputs, |_, _| {}).await
    }

    /// Like [`run_batch`](Self::run_batch), calling `on_progress(index, outcome)`
    /// after each DOI.
    #[instrument(skip_all, fields(total = inputs.len()))]
    pub async fn run_batch_with_progress<F>(
        &mut self,
        inputs: &[String],
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(usize, &HarvestOutcome),
    {
        let mut outcomes = Vec::with_capacity(inputs.len());
        for (index, input) in inputs.iter().enumerate() {
            let outcome = self.harvest_one(input).await;
            on_progress(index, &outcome);
            outcomes.push(outcome);
        }
        let report = BatchReport::new(outcomes);
        info!(summary = %report.summary(), "batch finished");
        report
    }

    /// Runs the full pipeline for one DOI and flushes the cache.
    #[instrument(skip(self), fields(doi = %input))]
    pub async fn harvest_one(&mut self, input: &str) -> HarvestOutcome {
        let doi = match Doi::parse(input) {
            Ok(doi) => doi,
            Err(e) => {
                warn!(error = %e, "invalid DOI");
                return HarvestOutcome::new(input.trim(), HarvestStatus::Error)
                    .with_detail(e.to_string());
            }
        };

        transition(&doi, HarvestState::Pending);
        let outcome = self.process(&doi).await;
        let terminal = if outcome.status == HarvestStatus::Error {
            HarvestState::Failed
        } else {
            HarvestState::Done
        };
        transition(&doi, terminal);

        if let Err(e) = self.cache.flush() {
            warn!(error = %e, "cache flush failed; continuing");
        }
        outcome
    }

    async fn process(&mut self, doi: &Doi) -> HarvestOutcome {
        if !self.options.refresh
            && let Some(entry) = self.cache.get_fresh(doi, Utc::now()).cloned()
        {
            transition(doi, HarvestState::Cached);
            match self.resolve_cached(doi, entry).await {
                CachedStep::Outcome(outcome) => return outcome,
                CachedStep::CheckOpenAccess(metadata) => {
                    return self.check_open_access(doi, metadata).await;
                }
                CachedStep::Download(metadata, oa) => {
                    return self.download(doi, metadata, oa, true).await;
                }
            }
        }

        let metadata = match self.metadata.lookup_metadata(doi).await {
            Ok(metadata) => metadata,
            Err(e) if e.is_not_found() => {
                info!("not found in Crossref");
                self.cache.put(CacheEntry::new(doi.clone(), None, None, None));
                return HarvestOutcome::new(doi.as_str(), HarvestStatus::NotFound)
                    .with_detail(DETAIL_NOT_FOUND);
            }
            Err(e) => {
                warn!(error = %e, "metadata lookup failed");
                return HarvestOutcome::new(doi.as_str(), HarvestStatus::Error)
                    .with_detail(e.to_string());
            }
        };
        transition(doi, HarvestState::MetadataFetched);

        self.check_open_access(doi, metadata).await
    }

    /// Decides how much of the pipeline a cached entry lets us skip.
    async fn resolve_cached(&self, doi: &Doi, entry: CacheEntry) -> CachedStep {
        let Some(metadata) = entry.metadata else {
            return CachedStep::Outcome(
                HarvestOutcome::new(doi.as_str(), HarvestStatus::NotFound)
                    .with_detail(DETAIL_NOT_FOUND)
                    .cached(true),
            );
        };
        let Some(oa) = entry.oa_result else {
            debug!("cached entry lacks an open-access result; checking again");
            return CachedStep::CheckOpenAccess(metadata);
        };
        if oa.downloadable_url().is_none() {
            return CachedStep::Outcome(
                HarvestOutcome::new(doi.as_str(), HarvestStatus::NotOpenAccess)
                    .with_detail(DETAIL_NOT_OA)
                    .cached(true)
                    .with_records(Some(metadata), Some(oa)),
            );
        }
        if let Some(path) = entry.local_pdf_path {
            if file_exists(&path).await {
                return CachedStep::Outcome(
                    HarvestOutcome::new(doi.as_str(), HarvestStatus::Found)
                        .with_pdf_path(path)
                        .cached(true)
                        .with_records(Some(metadata), Some(oa)),
                );
            }
            debug!(path = %path.display(), "cached PDF is gone; downloading again");
        }
        CachedStep::Download(metadata, oa)
    }

    async fn check_open_access(&mut self, doi: &Doi, metadata: MetadataRecord) -> HarvestOutcome {
        let oa = match self.open_access.lookup_open_access(doi).await {
            Ok(oa) => oa,
            Err(e) if e.is_not_found() => {
                debug!("Unpaywall has no record; treating as closed");
                OpenAccessResult::closed(doi.clone())
            }
            Err(e) => {
                // Crossref already confirmed the DOI, so this is not an ERROR.
                warn!(error = %e, "open-access lookup failed");
                self.cache.put(
                    CacheEntry::new(doi.clone(), Some(metadata.clone()), None, None),
                );
                return HarvestOutcome::new(doi.as_str(), HarvestStatus::NotOpenAccess)
                    .with_detail(format!("open-access lookup failed: {e}"))
                    .with_records(Some(metadata), None);
            }
        };
        transition(doi, HarvestState::OaChecked);

        if oa.downloadable_url().is_none() {
            info!(oa_status = ?oa.oa_status, "no open-access PDF");
            self.cache.put(
                CacheEntry::new(doi.clone(), Some(metadata.clone()), Some(oa.clone()), None),
            );
            return HarvestOutcome::new(doi.as_str(), HarvestStatus::NotOpenAccess)
                .with_detail(DETAIL_NOT_OA)
                .with_records(Some(metadata), Some(oa));
        }

        self.download(doi, metadata, oa, false).await
    }

    async fn download(
        &mut self,
        doi: &Doi,
        metadata: MetadataRecord,
        oa: OpenAccessResult,
        from_cache: bool,
    ) -> HarvestOutcome {
        let Some(url) = oa.downloadable_url().map(ToString::to_string) else {
            return HarvestOutcome::new(doi.as_str(), HarvestStatus::NotOpenAccess)
                .with_detail(DETAIL_NOT_OA)
                .cached(from_cache)
                .with_records(Some(metadata), Some(oa));
        };
        let destination = pdf_path_for_doi(&self.options.output_dir, doi.key());

        if self.options.dry_run {
            info!(url = %url, dest = %destination.display(), "dry run: skipping download");
            self.cache.put(
                CacheEntry::new(doi.clone(), Some(metadata.clone()), Some(oa.clone()), None),
            );
            return HarvestOutcome::new(doi.as_str(), HarvestStatus::Found)
                .with_detail(format!("dry run: would download {url}"))
                .cached(from_cache)
                .with_records(Some(metadata), Some(oa));
        }

        transition(doi, HarvestState::Downloading);
        let result = self
            .fetcher
            .download(&url, &destination, self.options.force)
            .await;

        let (saved, detail) = match result {
            Ok(receipt) => {
                info!(bytes = receipt.bytes_written, path = %receipt.path.display(), "PDF downloaded");
                (Some(receipt.path), None)
            }
            Err(DownloadError::AlreadyExists { path }) => {
                if has_pdf_magic(&path).await.unwrap_or(false) {
                    // No detail: a cached rerun must report the same outcome.
                    info!(path = %path.display(), "reusing existing PDF");
                    (Some(path), None)
                } else {
                    warn!(path = %path.display(), "existing file is not a PDF");
                    (
                        None,
                        Some(format!(
                            "{} exists but is not a PDF; use --force to replace it",
                            path.display()
                        )),
                    )
                }
            }
            Err(e) => {
                warn!(error = %e, "PDF download failed");
                (None, Some(e.to_string()))
            }
        };

        self.cache.put(
            CacheEntry::new(
                doi.clone(),
                Some(metadata.clone()),
                Some(oa.clone()),
                saved.clone(),
            ),
        );

        let mut outcome = match saved {
            Some(path) => HarvestOutcome::new(doi.as_str(), HarvestStatus::Found)
                .with_pdf_path(path)
                .cached(from_cache),
            None => HarvestOutcome::new(doi.as_str(), HarvestStatus::Error).cached(from_cache),
        }
        .with_records(Some(metadata), Some(oa));
        outcome.detail = detail;
        outcome
    }
}

fn transition(doi: &Doi, state: HarvestState) {
    debug!(doi = %doi, state = %state, "state transition");
}

async fn file_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
