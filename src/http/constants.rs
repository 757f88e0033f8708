//! Timeouts and retry defaults shared by the HTTP client.

use std::time::Duration;

/// Default HTTP connect timeout (15 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default whole-request timeout (30 seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default maximum attempts, including the first request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Default base delay for exponential backoff.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default cap on a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Default backoff multiplier (doubles each attempt).
pub const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Default upper bound for random jitter added to each delay.
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(250);

/// Maximum honoured Retry-After value (5 minutes).
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);
