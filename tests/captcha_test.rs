//! Integration tests for the CAPTCHA solving client using wiremock

use linkmark::captcha::CaptchaResolver;
use linkmark::config::CaptchaConfig;
use linkmark::error::SolveError;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(api_url: &str, max_polls: u32) -> CaptchaConfig {
    CaptchaConfig {
        api_url: api_url.to_string(),
        poll_interval_secs: 1,
        max_polls,
        api_key: Some(String::from("test-key")),
    }
}

/// Test the happy path: submit, one not-ready poll, then the token
#[tokio::test]
async fn test_submit_then_poll_until_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/in.php"))
        .and(query_param("method", "userrecaptcha"))
        .and(query_param("googlekey", "site-key-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "42"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/res.php"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": 0, "request": "CAPCHA_NOT_READY"}),
        ))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/res.php"))
        .and(query_param("id", "42"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "token-abc"})),
        )
        .mount(&mock_server)
        .await;

    let resolver = CaptchaResolver::new(&config(&mock_server.uri(), 5)).unwrap();
    let token = resolver
        .solve("site-key-1", "https://linkedin.com/in/jane-doe")
        .await
        .unwrap();

    assert_eq!(token, "token-abc");
}

/// Test that a rejected submission is terminal
#[tokio::test]
async fn test_submission_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/in.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": 0, "request": "ERROR_WRONG_USER_KEY"}),
        ))
        .mount(&mock_server)
        .await;

    let resolver = CaptchaResolver::new(&config(&mock_server.uri(), 5)).unwrap();
    let err = resolver
        .solve("site-key-1", "https://linkedin.com/in/jane-doe")
        .await
        .unwrap_err();

    match err {
        SolveError::SubmissionFailed(reason) => assert_eq!(reason, "ERROR_WRONG_USER_KEY"),
        other => panic!("Expected SubmissionFailed, got {other:?}"),
    }
}

/// Test that a terminal poll error stops polling
#[tokio::test]
async fn test_unsolvable_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/in.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "42"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/res.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": 0, "request": "ERROR_CAPTCHA_UNSOLVABLE"}),
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = CaptchaResolver::new(&config(&mock_server.uri(), 5)).unwrap();
    let err = resolver
        .solve("site-key-1", "https://linkedin.com/in/jane-doe")
        .await
        .unwrap_err();

    assert!(matches!(err, SolveError::SolveRejected(_)));
}

/// Test that the poll ceiling produces a timeout
#[tokio::test]
async fn test_poll_ceiling_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/in.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": 1, "request": "42"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/res.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({"status": 0, "request": "CAPCHA_NOT_READY"}),
        ))
        .expect(2)
        .mount(&mock_server)
        .await;

    let resolver = CaptchaResolver::new(&config(&mock_server.uri(), 2)).unwrap();
    let err = resolver
        .solve("site-key-1", "https://linkedin.com/in/jane-doe")
        .await
        .unwrap_err();

    assert!(matches!(err, SolveError::SolveTimeout));
}
