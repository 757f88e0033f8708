//! Error types for the HTTP client.

use thiserror::Error;

/// Errors returned by [`HttpClient`](super::HttpClient) once retries are done.
#[derive(Debug, Error)]
pub enum HttpError {
    /// A retryable failure persisted through every allowed attempt.
    #[error("request to {url} failed after {attempts} attempts: {last_error}")]
    Transient {
        /// The requested URL.
        url: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// HTTP status of the last attempt, when the server answered.
        last_status: Option<u16>,
        /// Description of the last failure.
        last_error: String,
    },

    /// The server answered with a non-retryable status (404, 400, 403, ...).
    #[error("HTTP {status} from {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A connection failure that retrying cannot fix (TLS, certificates).
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The requested URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be read after a successful status line.
    #[error("failed to read response body from {url}: {source}")]
    Body {
        /// The requested URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The body was not the JSON document the caller expected.
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The requested URL.
        url: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The URL could not be parsed or used.
    #[error("invalid URL '{url}': {reason}\n  Suggestion: Check the API base URL in your configuration")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl HttpError {
    /// Creates an error for exhausted retries.
    pub fn transient(
        url: impl Into<String>,
        attempts: u32,
        last_status: Option<u16>,
        last_error: impl Into<String>,
    ) -> Self {
        Self::Transient {
            url: url.into(),
            attempts,
            last_status,
            last_error: last_error.into(),
        }
    }

    /// Creates a permanent HTTP status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a permanent network error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a body read error.
    pub fn body(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Body {
            url: url.into(),
            source,
        }
    }

    /// Creates a malformed response error.
    pub fn malformed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// The HTTP status involved in the failure, if the server answered.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transient { last_status, .. } => *last_status,
            _ => None,
        }
    }

    /// True for a definitive 404 / 410 answer.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404 | 410, .. })
    }

    /// True when the failure came from exhausted retries.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
