//! Crossref metadata lookup.
//!
//! Queries `{base}/works/{doi}?mailto={contact}` and turns the `message`
//! object into a [`MetadataRecord`]. Passing `mailto` puts requests in
//! Crossref's polite pool.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::http::HttpClient;
use crate::parser::Doi;

use super::{LookupError, MetadataRecord, MetadataSource};

/// Default Crossref API base URL.
pub const DEFAULT_CROSSREF_API: &str = "https://api.crossref.org";

const SERVICE: &str = "crossref";

// ==================== Crossref API Response Types ====================

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    status: Option<String>,
    message: CrossrefMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CrossrefMessage {
    title: Option<Vec<String>>,
    author: Option<Vec<CrossrefAuthor>>,
    container_title: Option<Vec<String>>,
    publisher: Option<String>,
    published: Option<CrossrefDate>,
    published_print: Option<CrossrefDate>,
    published_online: Option<CrossrefDate>,
    issued: Option<CrossrefDate>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    given: Option<String>,
    family: Option<String>,
    /// Organisational authors carry only `name`.
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CrossrefDate {
    date_parts: Option<Vec<Vec<Option<i32>>>>,
}

// ==================== CrossrefClient ====================

/// Looks up DOI metadata through the Crossref REST API.
#[derive(Debug, Clone)]
pub struct CrossrefClient {
    http: HttpClient,
    base_url: String,
    mailto: String,
}

impl CrossrefClient {
    /// Creates a client for the public Crossref API.
    #[must_use]
    pub fn new(http: HttpClient, mailto: impl Into<String>) -> Self {
        Self::with_base_url(http, mailto, DEFAULT_CROSSREF_API)
    }

    /// Creates a client for a custom base URL (mirrors, tests).
    #[must_use]
    pub fn with_base_url(
        http: HttpClient,
        mailto: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            mailto: mailto.into(),
        }
    }

    fn works_url(&self, doi: &Doi) -> Result<String, LookupError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            LookupError::unexpected_shape(doi.as_str(), SERVICE, format!("invalid base URL: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                LookupError::unexpected_shape(doi.as_str(), SERVICE, "base URL cannot have a path")
            })?
            .pop_if_empty()
            .push("works")
            .push(doi.as_str());
        Ok(url.into())
    }
}

#[async_trait]
impl MetadataSource for CrossrefClient {
    #[tracing::instrument(skip(self), fields(source = SERVICE, doi = %doi))]
    async fn lookup_metadata(&self, doi: &Doi) -> Result<MetadataRecord, LookupError> {
        let url = self.works_url(doi)?;
        debug!(api_url = %url, "calling Crossref API");

        let params: Vec<(&str, &str)> = if self.mailto.is_empty() {
            Vec::new()
        } else {
            vec![("mailto", self.mailto.as_str())]
        };
        let body = self
            .http
            .get_json(&url, &params)
            .await
            .map_err(|e| LookupError::from_http(doi.as_str(), SERVICE, e))?;

        let response: CrossrefResponse = serde_json::from_value(body)
            .map_err(|e| LookupError::unexpected_shape(doi.as_str(), SERVICE, e.to_string()))?;
        if let Some(status) = &response.status
            && !status.eq_ignore_ascii_case("ok")
        {
            return Err(LookupError::unexpected_shape(
                doi.as_str(),
                SERVICE,
                format!("status was '{status}'"),
            ));
        }

        let record = build_record(doi.clone(), response.message);
        debug!(title = ?record.title, year = ?record.year, "Crossref metadata parsed");
        Ok(record)
    }
}

// ==================== Extraction Helpers ====================

fn build_record(doi: Doi, message: CrossrefMessage) -> MetadataRecord {
    let year = extract_year(message.published.as_ref())
        .or_else(|| extract_year(message.published_print.as_ref()))
        .or_else(|| extract_year(message.published_online.as_ref()))
        .or_else(|| extract_year(message.issued.as_ref()));

    MetadataRecord {
        doi,
        title: first_non_empty(message.title),
        authors: message
            .author
            .unwrap_or_default()
            .iter()
            .filter_map(format_author)
            .collect(),
        journal: first_non_empty(message.container_title),
        year,
        publisher: message.publisher.filter(|p| !p.trim().is_empty()),
    }
}

fn first_non_empty(values: Option<Vec<String>>) -> Option<String> {
    values?
        .into_iter()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

/// `"Given Family"`, falling back to whichever part exists, then `name`.
fn format_author(author: &CrossrefAuthor) -> Option<String> {
    let given = author.given.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let family = author.family.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (given, family) {
        (Some(g), Some(f)) => Some(format!("{g} {f}")),
        (Some(part), None) | (None, Some(part)) => Some(part.to_string()),
        (None, None) => author
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string),
    }
}

fn extract_year(date: Option<&CrossrefDate>) -> Option<i32> {
    date.and_then(|d| d.date_parts.as_ref())
        .and_then(|parts| parts.first())
        .and_then(|inner| inner.first())
        .copied()
        .flatten()
}
