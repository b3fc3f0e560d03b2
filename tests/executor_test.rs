//! Integration tests for the fetch executor using wiremock
//!
//! These tests validate pacing, retry and classification behavior against a
//! mock server reached over a direct connection.

mod common;

use linkmark::captcha::CaptchaResolver;
use linkmark::config::CaptchaConfig;
use linkmark::error::{FailureKind, FetchError};
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROFILE_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Jane Doe - Engineer at Acme | LinkedIn</title></head>
<body><h1>Jane Doe</h1></body>
</html>"#;

/// Test successful fetch and extraction from a mock server
#[tokio::test]
async fn test_fetch_profile_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_HTML))
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(3), None);
    let record = executor
        .fetch_profile(&format!("{}/in/jane-doe", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(record.name, "Jane Doe");
    assert_eq!(record.title.as_deref(), Some("Engineer"));
    assert_eq!(record.company.as_deref(), Some("Acme"));
}

/// Test that a server error is retried until success
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_HTML))
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(3), None);
    let body = executor
        .fetch(&format!("{}/in/jane-doe", mock_server.uri()))
        .await
        .unwrap();

    assert!(body.contains("Jane Doe"));
}

/// Test that a 404 fails immediately without retrying
#[tokio::test]
async fn test_permanent_status_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(3), None);
    let err = executor
        .fetch(&format!("{}/in/gone", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Http(404)));
    assert!(!err.is_retryable());
}

/// Test that exhausting the attempt budget reports the last failure kind
#[tokio::test]
async fn test_retries_exhausted_carries_last_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(2), None);
    let err = executor
        .fetch(&format!("{}/in/flaky", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 2);
            assert_eq!(last, FailureKind::Http(503));
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
}

/// Test that a 429 with Retry-After is waited out and retried
#[tokio::test]
async fn test_rate_limit_honored_then_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_HTML))
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(3), None);
    let body = executor
        .fetch(&format!("{}/in/jane-doe", mock_server.uri()))
        .await
        .unwrap();

    assert!(body.contains("Jane Doe"));
}

/// Test that repeated challenge pages end the fetch as blocked
#[tokio::test]
async fn test_blocked_pages_exhaust_as_blocked() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>Security check required</body></html>"),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let executor = common::executor(&common::fetch_config(2), None);
    let err = executor
        .fetch(&format!("{}/in/jane-doe", mock_server.uri()))
        .await
        .unwrap_err();

    match err {
        FetchError::RetriesExhausted { last, .. } => assert_eq!(last, FailureKind::Blocked),
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
}

/// Test the full CAPTCHA recovery path: challenge page, external solve,
/// retry carrying the token
#[tokio::test]
async fn test_captcha_solved_and_retried_with_token() {
    let mock_server = MockServer::start().await;
    let solver_server = MockServer::start().await;

    // Solver accepts the challenge and hands back a token on the first poll
    Mock::given(method("POST"))
        .and(path("/in.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "42"})),
        )
        .mount(&solver_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/res.php"))
        .and(query_param("id", "42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "token-abc"})),
        )
        .mount(&solver_server)
        .await;

    // The token-bearing retry gets the real page
    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .and(header("x-captcha-token", "token-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE_HTML))
        .mount(&mock_server)
        .await;

    // The first request gets the challenge page
    Mock::given(method("GET"))
        .and(path("/in/jane-doe"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>Complete this captcha <div data-sitekey="site-key-1"></div></body></html>"#,
        ))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    let captcha_config = CaptchaConfig {
        api_url: solver_server.uri(),
        poll_interval_secs: 1,
        max_polls: 3,
        api_key: Some(String::from("test-key")),
    };
    let resolver = Arc::new(CaptchaResolver::new(&captcha_config).unwrap());

    let executor = common::executor(&common::fetch_config(3), Some(resolver));
    let body = executor
        .fetch(&format!("{}/in/jane-doe", mock_server.uri()))
        .await
        .unwrap();

    assert!(body.contains("Jane Doe"));
}
