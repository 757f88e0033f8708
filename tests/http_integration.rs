//! Integration tests for the retrying HTTP client against a mock server.

mod support;
use support::socket_guard::{
    should_skip_socket_bound_test, socket_skip_return, start_mock_server_or_skip,
};
use support::{client_with_request_timeout, fast_client};

use std::time::{Duration, Instant};

use pdfharvest::HttpError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_transient_503_then_success_is_retried() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(6);
    let body = client
        .get_json(&format!("{}/flaky", mock_server.uri()), &[])
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_exhausted_retries_report_attempts_and_last_status() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&mock_server)
        .await;

    let client = fast_client(3);
    let err = client
        .get(&format!("{}/down", mock_server.uri()), &[])
        .await
        .unwrap_err();

    match err {
        HttpError::Transient {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_status, Some(502));
        }
        other => panic!("expected Transient, got {other:?}"),
    }
}

#[tokio::test]
async fn test_permanent_404_is_not_retried() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(6);
    let err = client
        .get(&format!("{}/missing", mock_server.uri()), &[])
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_429_honours_retry_after_then_succeeds() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = fast_client(2);
    let result = client
        .get_json(&format!("{}/limited", mock_server.uri()), &[])
        .await;

    assert!(result.is_ok(), "expected success after 429: {result:?}");
}

#[tokio::test]
async fn test_408_is_transient() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(408))
        .expect(2)
        .mount(&mock_server)
        .await;

    let err = fast_client(2)
        .get(&format!("{}/slow", mock_server.uri()), &[])
        .await
        .unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_json_is_permanent() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = fast_client(6)
        .get_json(&format!("{}/html", mock_server.uri()), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::MalformedResponse { .. }));
}

#[tokio::test]
async fn test_query_params_and_user_agent_are_sent() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/polite"))
        .and(query_param("mailto", "test@example.org"))
        .and(header(
            "user-agent",
            "pdfharvest-tests (mailto:test@example.org)",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fast_client(1)
        .get_json(
            &format!("{}/polite", mock_server.uri()),
            &[("mailto", "test@example.org")],
        )
        .await
        .unwrap();

    assert!(body.as_array().is_some_and(Vec::is_empty));
}

#[tokio::test]
async fn test_invalid_url_fails_without_request() {
    let err = fast_client(3).get("not a url", &[]).await.unwrap_err();
    assert!(matches!(err, HttpError::InvalidUrl { .. }));
}

/// Serves `body` with correct headers but writes it one byte per `gap`.
async fn spawn_drip_server(body: &'static [u8], gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
                    body.len()
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for byte in body {
                    if socket.write_all(&[*byte]).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(gap).await;
                }
            });
        }
    });
    format!("http://{addr}/slow")
}

#[tokio::test]
async fn test_slow_json_body_hits_request_deadline() {
    if should_skip_socket_bound_test() {
        return socket_skip_return();
    }
    // 12 bytes at 400 ms each would take ~4.8 s; the deadline is 1 s.
    let url = spawn_drip_server(br#"{"ok": true}"#, Duration::from_millis(400)).await;
    let client = client_with_request_timeout(1, Duration::from_secs(1));

    let started = Instant::now();
    let err = client.get_json(&url, &[]).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_secs(3), "took {elapsed:?}");
    assert!(err.is_transient(), "expected a timeout, got {err:?}");
}

#[tokio::test]
async fn test_slow_json_body_is_retried_after_deadline() {
    if should_skip_socket_bound_test() {
        return socket_skip_return();
    }
    let url = spawn_drip_server(br#"{"ok": true}"#, Duration::from_millis(400)).await;
    let client = client_with_request_timeout(2, Duration::from_millis(500));

    let err = client.get_json(&url, &[]).await.unwrap_err();

    match err {
        HttpError::Transient { attempts, .. } => assert_eq!(attempts, 2),
        other => panic!("expected Transient, got {other:?}"),
    }
}
