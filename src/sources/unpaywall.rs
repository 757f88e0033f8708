//! Unpaywall open-access lookup.
//!
//! Queries `{base}/{doi}?email={contact}` and picks the best PDF link:
//! the best OA location first, then every other OA location in order.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::http::HttpClient;
use crate::parser::Doi;

use super::{LookupError, OpenAccessResult, OpenAccessSource};

/// Default Unpaywall API base URL.
pub const DEFAULT_UNPAYWALL_API: &str = "https://api.unpaywall.org/v2";

const SERVICE: &str = "unpaywall";

#[derive(Debug, Default, Deserialize)]
struct UnpaywallResponse {
    #[serde(default)]
    is_oa: bool,
    oa_status: Option<String>,
    best_oa_location: Option<OaLocation>,
    #[serde(default)]
    oa_locations: Vec<OaLocation>,
}

#[derive(Debug, Default, Deserialize)]
struct OaLocation {
    url: Option<String>,
    url_for_pdf: Option<String>,
    license: Option<String>,
}

impl OaLocation {
    /// `url_for_pdf`, else the landing `url`; blank values count as absent.
    fn candidate_url(&self) -> Option<&str> {
        [self.url_for_pdf.as_deref(), self.url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|u| !u.is_empty())
    }
}

impl UnpaywallResponse {
    /// The location whose link will be downloaded, if any.
    fn best_location(&self) -> Option<&OaLocation> {
        self.best_oa_location
            .as_ref()
            .filter(|loc| loc.candidate_url().is_some())
            .or_else(|| {
                self.oa_locations
                    .iter()
                    .find(|loc| loc.candidate_url().is_some())
            })
    }

    fn into_result(self, doi: Doi) -> OpenAccessResult {
        let chosen = self.best_location();
        let pdf_url = chosen
            .and_then(OaLocation::candidate_url)
            .map(ToString::to_string);
        let license = chosen
            .and_then(|loc| loc.license.clone())
            .or_else(|| self.best_oa_location.as_ref().and_then(|loc| loc.license.clone()));
        OpenAccessResult {
            doi,
            is_open_access: self.is_oa,
            pdf_url,
            license,
            oa_status: self.oa_status,
        }
    }
}

/// Looks up open-access availability through the Unpaywall API.
#[derive(Debug, Clone)]
pub struct UnpaywallClient {
    http: HttpClient,
    base_url: String,
    email: String,
}

impl UnpaywallClient {
    /// Creates a client for the public Unpaywall API.
    #[must_use]
    pub fn new(http: HttpClient, email: impl Into<String>) -> Self {
        Self::with_base_url(http, email, DEFAULT_UNPAYWALL_API)
    }

    /// Creates a client for a custom base URL (mirrors, tests).
    #[must_use]
    pub fn with_base_url(
        http: HttpClient,
        email: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            email: email.into(),
        }
    }

    fn lookup_url(&self, doi: &Doi) -> Result<String, LookupError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            LookupError::unexpected_shape(doi.as_str(), SERVICE, format!("invalid base URL: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                LookupError::unexpected_shape(doi.as_str(), SERVICE, "base URL cannot have a path")
            })?
            .pop_if_empty()
            .push(doi.as_str());
        Ok(url.into())
    }
}

#[async_trait]
impl OpenAccessSource for UnpaywallClient {
    #[tracing::instrument(skip(self), fields(source = SERVICE, doi = %doi))]
    async fn lookup_open_access(&self, doi: &Doi) -> Result<OpenAccessResult, LookupError> {
        let url = self.lookup_url(doi)?;
        debug!(api_url = %url, "calling Unpaywall API");

        let body = self
            .http
            .get_json(&url, &[("email", self.email.as_str())])
            .await
            .map_err(|e| LookupError::from_http(doi.as_str(), SERVICE, e))?;

        let response: UnpaywallResponse = serde_json::from_value(body)
            .map_err(|e| LookupError::unexpected_shape(doi.as_str(), SERVICE, e.to_string()))?;
        let result = response.into_result(doi.clone());
        debug!(
            is_oa = result.is_open_access,
            oa_status = ?result.oa_status,
            pdf_url = ?result.pdf_url,
            "Unpaywall result parsed"
        );
        Ok(result)
    }
}
