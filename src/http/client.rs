//! HTTP client with timeouts, retry/backoff and a polite User-Agent.
//!
//! One [`HttpClient`] is built in `main` and shared by the Crossref and
//! Unpaywall sources and the PDF downloader, so they reuse one connection pool.

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use tracing::{debug, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use super::error::HttpError;
use super::retry::{
    FailureType, RetryDecision, RetryPolicy, classify_http_status, classify_reqwest_error,
    parse_retry_after,
};

/// Settings for building an [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Deadline for a whole buffered call (headers and body); for streamed
    /// bodies it bounds each read instead.
    pub request_timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry_policy: RetryPolicy,
}

impl ClientOptions {
    /// Options with default timeouts and retry policy.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Replaces both timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, connect_timeout: Duration, request_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.request_timeout = request_timeout;
        self
    }
}

/// GET-only HTTP client that retries transient failures.
///
/// # Example
///
/// ```no_run
/// use pdfharvest::http::{ClientOptions, HttpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(ClientOptions::new("pdfharvest-example"))?;
/// let body = client
///     .get_json("https://api.crossref.org/works/10.1000/xyz123", &[("mailto", "me@example.org")])
///     .await?;
/// println!("{}", body["message"]["title"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: RetryPolicy,
    request_timeout: Duration,
}

/// A successful attempt.
enum Fetched {
    /// Status is 2xx; the body is still on the wire.
    Streaming(Response),
    /// Status is 2xx and the body was read within the deadline.
    Buffered(Vec<u8>),
}

impl HttpClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the TLS backend or system
    /// configuration cannot be initialised.
    pub fn new(options: ClientOptions) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.request_timeout)
            .gzip(true)
            .user_agent(options.user_agent)
            .build()?;
        Ok(Self {
            client,
            policy: options.retry_policy,
            request_timeout: options.request_timeout,
        })
    }

    /// The retry policy in use.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Performs a GET with query parameters and returns the response once the
    /// status is 2xx. The body is left unread so callers can stream it; each
    /// read is bounded by the request timeout, not the whole transfer.
    ///
    /// # Errors
    ///
    /// - [`HttpError::InvalidUrl`] when `url` cannot be parsed
    /// - [`HttpError::Status`] / [`HttpError::Network`] for permanent failures
    /// - [`HttpError::Transient`] when every attempt failed transiently
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Response, HttpError> {
        match self.fetch(url, params, false).await? {
            Fetched::Streaming(response) => Ok(response),
            Fetched::Buffered(_) => Err(HttpError::malformed(url, "unexpected buffered body")),
        }
    }

    /// Performs a GET and parses the body as JSON.
    ///
    /// Each attempt, body included, must finish within the request timeout;
    /// an attempt that runs over is retried like any other timeout.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus [`HttpError::Body`] when the body
    /// cannot be read and [`HttpError::MalformedResponse`] when it is not JSON.
    #[instrument(skip(self, params), fields(url = %url))]
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, HttpError> {
        let bytes = match self.fetch(url, params, true).await? {
            Fetched::Buffered(bytes) => bytes,
            Fetched::Streaming(response) => response
                .bytes()
                .await
                .map_err(|e| HttpError::body(url, e))?
                .to_vec(),
        };
        serde_json::from_slice(&bytes).map_err(|e| HttpError::malformed(url, e.to_string()))
    }

    /// The retry loop shared by [`get`](Self::get) and [`get_json`](Self::get_json).
    async fn fetch(
        &self,
        url: &str,
        params: &[(&str, &str)],
        buffer_body: bool,
    ) -> Result<Fetched, HttpError> {
        let target = build_url(url, params)?;
        let mut attempt: u32 = 1;

        loop {
            let mut request = self.client.get(target.clone());
            if buffer_body {
                // Total deadline: connect, headers and body of this attempt.
                request = request.timeout(self.request_timeout);
            }

            let (failure, retry_after, status, error) = match request.send().await {
                Ok(response) if response.status().is_success() => {
                    let status = response.status().as_u16();
                    debug!(status, attempt, "request succeeded");
                    if !buffer_body {
                        return Ok(Fetched::Streaming(response));
                    }
                    match response.bytes().await {
                        Ok(body) => return Ok(Fetched::Buffered(body.to_vec())),
                        Err(e) if e.is_timeout() => (
                            FailureType::Transient,
                            None,
                            Some(status),
                            "response body timed out".to_string(),
                        ),
                        Err(e) => return Err(HttpError::body(url, e)),
                    }
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after);
                    let failure = classify_http_status(status);
                    if failure == FailureType::Permanent {
                        debug!(status, "permanent HTTP status");
                        return Err(HttpError::status(url, status));
                    }
                    (failure, retry_after, Some(status), format!("HTTP {status}"))
                }
                Err(e) => {
                    let failure = classify_reqwest_error(&e);
                    if failure == FailureType::Permanent {
                        warn!(error = %e, "permanent network error");
                        return Err(if e.is_builder() {
                            HttpError::invalid_url(url, e.to_string())
                        } else {
                            HttpError::network(url, e)
                        });
                    }
                    let description = if e.is_timeout() {
                        "request timed out".to_string()
                    } else {
                        e.to_string()
                    };
                    (failure, None, None, description)
                }
            };

            match self.policy.should_retry(failure, attempt, retry_after) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(attempt, %reason, error = %error, "giving up");
                    return Err(HttpError::transient(url, attempt, status, error));
                }
            }
        }
    }
}

/// Parses `url` and appends `params` as percent-encoded query pairs.
fn build_url(url: &str, params: &[(&str, &str)]) -> Result<Url, HttpError> {
    let mut parsed = Url::parse(url).map_err(|e| HttpError::invalid_url(url, e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(HttpError::invalid_url(
            url,
            format!("unsupported scheme '{}'", parsed.scheme()),
        ));
    }
    if !params.is_empty() {
        let mut pairs = parsed.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(parsed)
}
