#![allow(dead_code)]

pub mod socket_guard;

use std::time::Duration;

use pdfharvest::{ClientOptions, HttpClient, RetryPolicy};

/// Minimal PDF body accepted by the signature check.
pub const PDF_BODY: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";

/// Client with fast, deterministic retries so failure paths finish quickly.
pub fn fast_client(max_attempts: u32) -> HttpClient {
    client_with_request_timeout(max_attempts, Duration::from_secs(5))
}

/// Like [`fast_client`] with a custom request timeout.
pub fn client_with_request_timeout(max_attempts: u32, request_timeout: Duration) -> HttpClient {
    let policy = RetryPolicy::new(
        max_attempts,
        Duration::from_millis(10),
        Duration::from_millis(50),
        2.0,
    )
    .with_max_jitter(Duration::ZERO);
    HttpClient::new(
        ClientOptions::new("pdfharvest-tests (mailto:test@example.org)")
            .with_retry_policy(policy)
            .with_timeouts(Duration::from_secs(5), request_timeout),
    )
    .unwrap()
}
