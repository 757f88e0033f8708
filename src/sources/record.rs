//! Records produced by the metadata and open-access lookups.

use serde::{Deserialize, Serialize};

use crate::parser::Doi;

/// Bibliographic metadata for one DOI, as reported by Crossref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// The DOI the record describes.
    pub doi: Doi,
    /// First title, if any.
    pub title: Option<String>,
    /// Authors as `"Given Family"`, in publication order.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Container (journal, proceedings) title.
    pub journal: Option<String>,
    /// Publication year.
    pub year: Option<i32>,
    /// Publisher name.
    pub publisher: Option<String>,
}

impl MetadataRecord {
    /// A record with only the DOI filled in.
    #[must_use]
    pub fn new(doi: Doi) -> Self {
        Self {
            doi,
            title: None,
            authors: Vec::new(),
            journal: None,
            year: None,
            publisher: None,
        }
    }
}

/// Open-access availability for one DOI, as reported by Unpaywall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAccessResult {
    /// The DOI the result describes.
    pub doi: Doi,
    /// Whether any open-access copy is known.
    pub is_open_access: bool,
    /// Best direct link to a PDF, when one is known.
    pub pdf_url: Option<String>,
    /// License of the chosen location (e.g. `cc-by`).
    pub license: Option<String>,
    /// Unpaywall OA colour (`gold`, `green`, `bronze`, `hybrid`, `closed`).
    pub oa_status: Option<String>,
}

impl OpenAccessResult {
    /// A "not open access" result.
    #[must_use]
    pub fn closed(doi: Doi) -> Self {
        Self {
            doi,
            is_open_access: false,
            pdf_url: None,
            license: None,
            oa_status: None,
        }
    }

    /// The PDF URL to download, only for open-access results.
    #[must_use]
    pub fn downloadable_url(&self) -> Option<&str> {
        if self.is_open_access {
            self.pdf_url.as_deref().filter(|url| !url.trim().is_empty())
        } else {
            None
        }
    }
}
