//! pdfharvest core library
//!
//! Looks up scientific articles by DOI in Crossref (metadata) and Unpaywall
//! (open-access availability), downloads the open-access PDFs and remembers
//! every answer in a local JSON cache so repeated runs stay off the network.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`parser`] - DOI validation, normalization and list-file parsing
//! - [`http`] - HTTP client with retry, backoff and `Retry-After` handling
//! - [`sources`] - Crossref and Unpaywall lookups behind async traits
//! - [`download`] - Streaming PDF download with signature check
//! - [`cache`] - JSON-file backed DOI cache
//! - [`harvest`] - Per-DOI orchestration, batch outcomes and the run report

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod atomic_file;
pub mod cache;
pub mod download;
pub mod harvest;
pub mod http;
pub mod parser;
pub mod sources;
mod user_agent;

// Re-export commonly used types
pub use atomic_file::write_atomic;
pub use cache::{Cache, CacheEntry, CacheError, CacheWarning};
pub use download::{DownloadError, PdfDownloader, PdfFetcher, sanitize_doi_filename};
pub use harvest::{
    BatchReport, BatchSummary, HarvestOptions, HarvestOutcome, HarvestStatus, Harvester, RunReport,
};
pub use http::{ClientOptions, HttpClient, HttpError, RetryPolicy};
pub use parser::{Doi, ParseError, parse_doi_list};
pub use sources::{
    CrossrefClient, LookupError, MetadataRecord, MetadataSource, OpenAccessResult,
    OpenAccessSource, UnpaywallClient,
};
pub use user_agent::polite_user_agent;
