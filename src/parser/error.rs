//! Error types for DOI parsing.

use thiserror::Error;

/// Errors that can occur while validating a DOI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or whitespace only
    #[error("empty DOI\n  Suggestion: Provide a DOI such as 10.1000/xyz123")]
    Empty,

    /// DOI does not follow the `10.<registrant>/<suffix>` shape
    #[error("invalid DOI '{doi}': {reason}\n  Suggestion: {suggestion}")]
    InvalidDoi {
        /// The DOI that failed validation
        doi: String,
        /// Why the DOI is invalid
        reason: String,
        /// How to fix the issue
        suggestion: String,
    },
}

impl ParseError {
    /// Creates an `InvalidDoi` error with the standard suggestion.
    #[must_use]
    pub fn invalid_doi(doi: &str, reason: &str) -> Self {
        Self::InvalidDoi {
            doi: doi.to_string(),
            reason: reason.to_string(),
            suggestion: "DOIs look like 10.1234/suffix (a doi: prefix or https://doi.org/ URL is also accepted)".to_string(),
        }
    }

    /// Creates an `InvalidDoi` error for a DOI missing its `/suffix` part.
    #[must_use]
    pub fn doi_no_suffix(doi: &str) -> Self {
        Self::InvalidDoi {
            doi: doi.to_string(),
            reason: "missing suffix after '/'".to_string(),
            suggestion: "Check that the DOI was not truncated".to_string(),
        }
    }
}
