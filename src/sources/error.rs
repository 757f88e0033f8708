//! Error type shared by the lookup sources.

use thiserror::Error;

use crate::http::HttpError;

/// Errors from a metadata or open-access lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The service has no record of the DOI.
    #[error("{doi} not found in {service}")]
    NotFound {
        /// The DOI looked up.
        doi: String,
        /// Service name (`crossref`, `unpaywall`).
        service: &'static str,
    },

    /// The request failed after retries or with a permanent error.
    #[error("{service} lookup failed for {doi}: {source}")]
    Http {
        /// The DOI looked up.
        doi: String,
        /// Service name.
        service: &'static str,
        /// The underlying HTTP error.
        #[source]
        source: HttpError,
    },

    /// The response was JSON but not shaped like the service's documents.
    #[error("unexpected {service} response for {doi}: {reason}")]
    UnexpectedShape {
        /// The DOI looked up.
        doi: String,
        /// Service name.
        service: &'static str,
        /// What did not match.
        reason: String,
    },
}

impl LookupError {
    /// Maps an HTTP error, turning 404/410 into [`LookupError::NotFound`].
    pub fn from_http(doi: impl Into<String>, service: &'static str, source: HttpError) -> Self {
        let doi = doi.into();
        if source.is_not_found() {
            Self::NotFound { doi, service }
        } else {
            Self::Http {
                doi,
                service,
                source,
            }
        }
    }

    /// Creates an unexpected-shape error.
    pub fn unexpected_shape(
        doi: impl Into<String>,
        service: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnexpectedShape {
            doi: doi.into(),
            service,
            reason: reason.into(),
        }
    }

    /// True when the service answered "no such DOI".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
