//! Integration tests for the Crossref and Unpaywall clients.

mod support;
use support::fast_client;
use support::socket_guard::{socket_skip_return, start_mock_server_or_skip};

use pdfharvest::parser::Doi;
use pdfharvest::{
    CrossrefClient, LookupError, MetadataSource, OpenAccessSource, UnpaywallClient,
};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, ResponseTemplate};

fn doi(value: &str) -> Doi {
    Doi::parse(value).unwrap()
}

// ==================== Crossref Tests ====================

#[tokio::test]
async fn test_crossref_lookup_parses_metadata() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/works/10.1000%2Fxyz123"))
        .and(query_param("mailto", "me@example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "message": {
                "title": ["Deep Learning for Widgets"],
                "author": [
                    {"given": "Ada", "family": "Lovelace"},
                    {"family": "Turing"},
                    {"name": "Widget Consortium"}
                ],
                "container-title": ["Journal of Widgets"],
                "publisher": "Widget Press",
                "published-print": {"date-parts": [[2021, 3]]},
                "issued": {"date-parts": [[2020]]}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CrossrefClient::with_base_url(fast_client(2), "me@example.org", mock_server.uri());
    let record = client.lookup_metadata(&doi("10.1000/xyz123")).await.unwrap();

    assert_eq!(record.title.as_deref(), Some("Deep Learning for Widgets"));
    assert_eq!(
        record.authors,
        vec!["Ada Lovelace", "Turing", "Widget Consortium"]
    );
    assert_eq!(record.journal.as_deref(), Some("Journal of Widgets"));
    assert_eq!(record.publisher.as_deref(), Some("Widget Press"));
    assert_eq!(record.year, Some(2021));
}

#[tokio::test]
async fn test_crossref_404_is_not_found() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path_regex(r"^/works/10\..+"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Resource not found."))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = CrossrefClient::with_base_url(fast_client(3), "me@example.org", mock_server.uri());
    let err = client
        .lookup_metadata(&doi("10.1000/missing"))
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    assert!(err.to_string().contains("crossref"));
}

#[tokio::test]
async fn test_crossref_unexpected_shape() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path_regex(r"^/works/10\..+"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .mount(&mock_server)
        .await;

    let client = CrossrefClient::with_base_url(fast_client(1), "me@example.org", mock_server.uri());
    let err = client.lookup_metadata(&doi("10.1000/a")).await.unwrap_err();

    assert!(matches!(err, LookupError::UnexpectedShape { .. }));
}

#[tokio::test]
async fn test_crossref_server_errors_exhaust_retries() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path_regex(r"^/works/10\..+"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = CrossrefClient::with_base_url(fast_client(2), "me@example.org", mock_server.uri());
    let err = client.lookup_metadata(&doi("10.1000/a")).await.unwrap_err();

    match err {
        LookupError::Http { source, .. } => assert!(source.is_transient()),
        other => panic!("expected Http error, got {other:?}"),
    }
}

// ==================== Unpaywall Tests ====================

#[tokio::test]
async fn test_unpaywall_open_access_result() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path("/v2/10.1000%2Fxyz123"))
        .and(query_param("email", "me@example.org"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "doi": "10.1000/xyz123",
            "is_oa": true,
            "oa_status": "green",
            "best_oa_location": {
                "url": "https://repo.example.org/record/1",
                "url_for_pdf": "https://repo.example.org/record/1.pdf",
                "license": "cc-by"
            },
            "oa_locations": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = UnpaywallClient::with_base_url(
        fast_client(2),
        "me@example.org",
        format!("{}/v2", mock_server.uri()),
    );
    let result = client
        .lookup_open_access(&doi("10.1000/xyz123"))
        .await
        .unwrap();

    assert!(result.is_open_access);
    assert_eq!(
        result.downloadable_url(),
        Some("https://repo.example.org/record/1.pdf")
    );
    assert_eq!(result.license.as_deref(), Some("cc-by"));
    assert_eq!(result.oa_status.as_deref(), Some("green"));
}

#[tokio::test]
async fn test_unpaywall_closed_result() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/10\..+"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "is_oa": false,
            "oa_status": "closed",
            "best_oa_location": null,
            "oa_locations": []
        })))
        .mount(&mock_server)
        .await;

    let client = UnpaywallClient::with_base_url(
        fast_client(1),
        "me@example.org",
        format!("{}/v2", mock_server.uri()),
    );
    let result = client
        .lookup_open_access(&doi("10.1000/xyz123"))
        .await
        .unwrap();

    assert!(!result.is_open_access);
    assert_eq!(result.downloadable_url(), None);
}

#[tokio::test]
async fn test_unpaywall_404_is_not_found() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return socket_skip_return();
    };

    Mock::given(method("GET"))
        .and(path_regex(r"^/v2/10\..+"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = UnpaywallClient::with_base_url(
        fast_client(3),
        "me@example.org",
        format!("{}/v2", mock_server.uri()),
    );
    let err = client
        .lookup_open_access(&doi("10.1000/nope"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
