//! PDF retrieval.
//!
//! - [`PdfFetcher`] is the seam the orchestrator depends on
//! - [`PdfDownloader`] streams bodies to disk with `%PDF-` validation
//! - [`sanitize_doi_filename`] maps DOI keys to file names

mod error;
mod filename;
mod pdf;

pub use error::DownloadError;
pub use filename::{MAX_STEM_BYTES, pdf_path_for_doi, sanitize_doi_filename};
pub use pdf::{DownloadReceipt, PDF_MAGIC, PdfDownloader, PdfFetcher, has_pdf_magic};
