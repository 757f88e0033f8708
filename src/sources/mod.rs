//! Metadata and open-access lookups.
//!
//! The orchestrator depends on the [`MetadataSource`] and
//! [`OpenAccessSource`] traits; [`CrossrefClient`] and [`UnpaywallClient`]
//! are the production implementations.

mod crossref;
mod error;
mod record;
mod unpaywall;

use async_trait::async_trait;

use crate::parser::Doi;

pub use crossref::{CrossrefClient, DEFAULT_CROSSREF_API};
pub use error::LookupError;
pub use record::{MetadataRecord, OpenAccessResult};
pub use unpaywall::{DEFAULT_UNPAYWALL_API, UnpaywallClient};

/// Bibliographic metadata lookup (Crossref).
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches metadata for `doi`.
    ///
    /// # Errors
    ///
    /// [`LookupError::NotFound`] when the service does not know the DOI;
    /// other variants for transport or format failures.
    async fn lookup_metadata(&self, doi: &Doi) -> Result<MetadataRecord, LookupError>;
}

/// Open-access availability lookup (Unpaywall).
#[async_trait]
pub trait OpenAccessSource: Send + Sync {
    /// Fetches open-access information for `doi`.
    ///
    /// # Errors
    ///
    /// Same contract as [`MetadataSource::lookup_metadata`].
    async fn lookup_open_access(&self, doi: &Doi) -> Result<OpenAccessResult, LookupError>;
}
