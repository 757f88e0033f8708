//! Error types for PDF downloads.

use std::path::PathBuf;

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while downloading a PDF.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The destination exists and overwriting was not requested.
    #[error("{path} already exists\n  Suggestion: Use --force to overwrite existing PDFs")]
    AlreadyExists {
        /// The existing file.
        path: PathBuf,
    },

    /// The body did not start with the `%PDF-` signature.
    #[error("{url} did not return a PDF: {reason}")]
    InvalidContent {
        /// The requested URL.
        url: String,
        /// What was received instead.
        reason: String,
    },

    /// The request failed (after retries where applicable).
    #[error("download of {url} failed: {source}")]
    Http {
        /// The requested URL.
        url: String,
        /// The underlying HTTP error.
        #[source]
        source: HttpError,
    },

    /// File system error while writing the PDF.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an already-exists error.
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::AlreadyExists { path: path.into() }
    }

    /// Creates an invalid-content error.
    pub fn invalid_content(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidContent {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an HTTP error.
    pub fn http(url: impl Into<String>, source: HttpError) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
