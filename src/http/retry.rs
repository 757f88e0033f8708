//! Retry logic with exponential backoff for transient HTTP failures.
//!
//! A failed request is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - timeouts, connection errors, 408 and 5xx
//! - [`FailureType::RateLimited`] - 429, honours `Retry-After` when present
//! - [`FailureType::Permanent`] - other 4xx, TLS problems, invalid URLs
//!
//! The [`RetryPolicy`] then decides whether another attempt is made and how
//! long to wait first.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use pdfharvest::http::{RetryDecision, RetryPolicy, classify_http_status};
//!
//! let policy = RetryPolicy::new(3, Duration::from_millis(100), Duration::from_secs(1), 2.0)
//!     .with_max_jitter(Duration::ZERO);
//!
//! // A 503 on the first attempt is retried after the base delay.
//! let decision = policy.should_retry(classify_http_status(503), 1, None);
//! assert_eq!(
//!     decision,
//!     RetryDecision::Retry { delay: Duration::from_millis(100), attempt: 2 }
//! );
//!
//! // A 404 never is.
//! let decision = policy.should_retry(classify_http_status(404), 1, None);
//! assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
//! ```

use std::error::Error as _;
use std::time::{Duration, SystemTime};

use rand::Rng;
use tracing::{debug, instrument, warn};

use super::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
    DEFAULT_MAX_JITTER, MAX_RETRY_AFTER,
};

/// Classification of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    Transient,

    /// Failure that won't succeed regardless of retries.
    Permanent,

    /// Server rate limiting (HTTP 429).
    RateLimited,
}

/// Decision on whether to retry a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Configuration for retry behavior with exponential backoff.
///
/// # Default Values
///
/// - `max_attempts`: 6
/// - `base_delay`: 500 ms
/// - `max_delay`: 10 seconds
/// - `backoff_multiplier`: 2.0
/// - `max_jitter`: 250 ms
///
/// # Delay Calculation
///
/// ```text
/// delay = min(base_delay * multiplier^(attempt - 1), max_delay) + jitter
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with custom settings and the default jitter.
    ///
    /// `max_attempts` includes the initial attempt and is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Creates a policy with a custom `max_attempts`, using defaults otherwise.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Replaces the jitter bound. Zero makes delays deterministic.
    #[must_use]
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Determines whether to retry a failed request.
    ///
    /// `attempt` is the attempt that just failed (1-indexed). For rate-limited
    /// failures a server-provided `retry_after` replaces the backoff delay.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(
        &self,
        failure_type: FailureType,
        attempt: u32,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = match (failure_type, retry_after) {
            (FailureType::RateLimited, Some(server_delay)) => server_delay.min(MAX_RETRY_AFTER),
            _ => self.calculate_delay(attempt),
        };

        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );

        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let multiplier = f64::from(self.backoff_multiplier);

        // attempt 1 = base * multiplier^0
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * multiplier.powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64) + self.calculate_jitter()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn calculate_jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

/// Classifies an HTTP status code into a failure type.
///
/// | Status | Type |
/// |--------|------|
/// | 408 | Transient |
/// | 429 | RateLimited |
/// | other 4xx | Permanent |
/// | 5xx | Transient |
/// | anything else | Permanent |
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn classify_http_status(status: u16) -> FailureType {
    match status {
        408 => FailureType::Transient,   // Request Timeout
        429 => FailureType::RateLimited, // Too Many Requests
        status if (400..500).contains(&status) => FailureType::Permanent,
        status if (500..600).contains(&status) => FailureType::Transient,
        _ => FailureType::Permanent,
    }
}

/// Classifies a transport-level reqwest error.
///
/// Timeouts and connection failures are transient unless the chain points at
/// TLS/certificate problems; builder errors (bad URL) are permanent.
#[must_use]
pub fn classify_reqwest_error(error: &reqwest::Error) -> FailureType {
    if error.is_builder() || is_tls_error(error) {
        FailureType::Permanent
    } else {
        FailureType::Transient
    }
}

fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        text.push(' ');
        text.push_str(&inner.to_string());
        source = inner.source();
    }
    let text = text.to_lowercase();
    text.contains("certificate")
        || text.contains("tls")
        || text.contains("ssl")
        || text.contains("handshake")
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date).
///
/// Values above five minutes are capped; dates in the past yield zero;
/// negative or unparseable values yield `None`.
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Option<Duration> {
    let header_value = header_value.trim();

    if let Ok(seconds) = header_value.parse::<i64>() {
        if seconds < 0 {
            debug!(seconds, "negative Retry-After value, ignoring");
            return None;
        }
        #[allow(clippy::cast_sign_loss)]
        let duration = Duration::from_secs(seconds as u64);
        return Some(cap_retry_after(duration));
    }

    if let Ok(datetime) = httpdate::parse_http_date(header_value) {
        match datetime.duration_since(SystemTime::now()) {
            Ok(duration) => Some(cap_retry_after(duration)),
            Err(_) => {
                debug!(header_value, "Retry-After date is in the past, returning zero");
                Some(Duration::ZERO)
            }
        }
    } else {
        debug!(header_value, "unparseable Retry-After value");
        None
    }
}

fn cap_retry_after(duration: Duration) -> Duration {
    if duration > MAX_RETRY_AFTER {
        warn!(
            delay_secs = duration.as_secs(),
            max_secs = MAX_RETRY_AFTER.as_secs(),
            "Retry-After exceeds maximum, capping"
        );
        MAX_RETRY_AFTER
    } else {
        duration
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 6);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
        assert!((policy.backoff_multiplier - 2.0).abs() < f32::EPSILON);
        assert_eq!(policy.max_jitter, Duration::from_millis(250));
    }

    #[test]
    fn test_retry_policy_max_attempts_minimum_is_one() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts(), 1);
        assert_eq!(
            RetryPolicy::new(0, Duration::ZERO, Duration::ZERO, 2.0).max_attempts(),
            1
        );
    }

    // ==================== Delay Calculation Tests ====================

    #[test]
    fn test_delay_doubles_without_jitter() {
        let policy = RetryPolicy::new(6, Duration::from_millis(500), Duration::from_secs(10), 2.0)
            .with_max_jitter(Duration::ZERO);
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(500));
        assert_eq!(policy.calculate_delay(2), Duration::from_secs(1));
        assert_eq!(policy.calculate_delay(3), Duration::from_secs(2));
    }

    #[test]
    fn test_delay_respects_max_delay() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5), 2.0)
            .with_max_jitter(Duration::ZERO);
        assert_eq!(policy.calculate_delay(6), Duration::from_secs(5));
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..100 {
            let jitter = policy.calculate_jitter();
            assert!(jitter <= DEFAULT_MAX_JITTER, "jitter {jitter:?} exceeds max");
        }
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_http_status_table() {
        assert_eq!(classify_http_status(400), FailureType::Permanent);
        assert_eq!(classify_http_status(403), FailureType::Permanent);
        assert_eq!(classify_http_status(404), FailureType::Permanent);
        assert_eq!(classify_http_status(408), FailureType::Transient);
        assert_eq!(classify_http_status(429), FailureType::RateLimited);
        assert_eq!(classify_http_status(500), FailureType::Transient);
        assert_eq!(classify_http_status(503), FailureType::Transient);
        assert_eq!(classify_http_status(599), FailureType::Transient);
        assert_eq!(classify_http_status(302), FailureType::Permanent);
    }

    // ==================== Should Retry Decision Tests ====================

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let decision = RetryPolicy::default().should_retry(FailureType::Permanent, 1, None);
        let RetryDecision::DoNotRetry { reason } = decision else {
            panic!("expected DoNotRetry");
        };
        assert!(reason.contains("permanent"));
    }

    #[test]
    fn test_should_retry_transient_retries() {
        let decision = RetryPolicy::default().should_retry(FailureType::Transient, 1, None);
        assert!(matches!(decision, RetryDecision::Retry { attempt: 2, .. }));
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::with_max_attempts(3);
        assert!(matches!(
            policy.should_retry(FailureType::Transient, 2, None),
            RetryDecision::Retry { .. }
        ));
        let RetryDecision::DoNotRetry { reason } =
            policy.should_retry(FailureType::Transient, 3, None)
        else {
            panic!("expected DoNotRetry");
        };
        assert!(reason.contains("exhausted"));
    }

    #[test]
    fn test_should_retry_rate_limited_uses_retry_after() {
        let policy = RetryPolicy::default();
        let decision =
            policy.should_retry(FailureType::RateLimited, 1, Some(Duration::from_secs(7)));
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_secs(7),
                attempt: 2
            }
        );
    }

    #[test]
    fn test_should_retry_transient_ignores_retry_after() {
        let policy = RetryPolicy::default().with_max_jitter(Duration::ZERO);
        let decision = policy.should_retry(FailureType::Transient, 1, Some(Duration::from_secs(60)));
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_millis(500),
                attempt: 2
            }
        );
    }

    // ==================== Retry-After Parsing Tests ====================

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
    }

    #[test]
    fn test_parse_retry_after_caps_at_five_minutes() {
        assert_eq!(parse_retry_after("86400"), Some(MAX_RETRY_AFTER));
    }

    #[test]
    fn test_parse_retry_after_negative_and_garbage() {
        assert_eq!(parse_retry_after("-5"), None);
        assert_eq!(parse_retry_after("soon"), None);
    }

    #[test]
    fn test_parse_retry_after_past_http_date_is_zero() {
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_parse_retry_after_future_http_date() {
        let future = SystemTime::now() + Duration::from_secs(120);
        let header = httpdate::fmt_http_date(future);
        let parsed = parse_retry_after(&header).unwrap();
        assert!(parsed <= Duration::from_secs(120));
        assert!(parsed >= Duration::from_secs(100));
    }
}
