//! HTTP access for the metadata services and PDF hosts.
//!
//! - [`HttpClient`] wraps `reqwest` with timeouts and a polite User-Agent
//! - [`RetryPolicy`] decides when and how long to back off
//! - [`HttpError`] is what callers see once retries are exhausted

mod client;
mod constants;
mod error;
mod retry;

pub use client::{ClientOptions, HttpClient};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY, DEFAULT_MAX_JITTER, MAX_RETRY_AFTER, REQUEST_TIMEOUT_SECS,
};
pub use error::HttpError;
pub use retry::{
    FailureType, RetryDecision, RetryPolicy, classify_http_status, classify_reqwest_error,
    parse_retry_after,
};
