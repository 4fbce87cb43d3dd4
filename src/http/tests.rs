//! Tests for the HTTP client module

use super::*;
use crate::error::Error;
use reqwest::Method;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts).with_backoff(Duration::from_millis(1), Duration::from_millis(1))
}

fn client_for(server: &MockServer, attempts: u32) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .bearer_token("secret-token")
        .retry(fast_retry(attempts))
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.retry.max_attempts, 3);
    assert!(config.base_url.is_none());
    assert!(config.bearer_token.is_none());
    assert!(config.rate_limit.is_some());
    assert!(config.user_agent.starts_with("tap-zendesk-sell/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.example.com")
        .timeout(Duration::from_secs(60))
        .retry(RetryPolicy::new(5))
        .bearer_token("tok")
        .header("X-Custom", "value")
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.base_url, Some("https://api.example.com".to_string()));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.bearer_token.as_deref(), Some("tok"));
    assert_eq!(
        config.default_headers.get("X-Custom"),
        Some(&"value".to_string())
    );
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_request_config_builder() {
    let config = RequestConfig::new()
        .query("page", "1")
        .query("per_page", "100")
        .header("X-Request-Id", "abc123")
        .json(json!({"key": "value"}))
        .timeout(Duration::from_secs(10))
        .retry(RetryPolicy::no_retry());

    assert_eq!(
        config.query,
        vec![
            ("page".to_string(), "1".to_string()),
            ("per_page".to_string(), "100".to_string())
        ]
    );
    assert_eq!(
        config.headers.get("X-Request-Id"),
        Some(&"abc123".to_string())
    );
    assert!(config.body.is_some());
    assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    assert_eq!(config.retry, Some(RetryPolicy::no_retry()));
}

#[test]
fn test_build_url() {
    let config = HttpClientConfig::builder()
        .base_url("https://api.getbase.com/v2/")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(
        client.build_url("/deals"),
        "https://api.getbase.com/v2/deals"
    );
    assert_eq!(
        client.build_url("https://other.example.com/next?page=2"),
        "https://other.example.com/next?page=2"
    );
}

#[tokio::test]
async fn test_bearer_token_and_query_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/deals"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let value = client
        .request_value(
            Method::GET,
            "/deals",
            RequestConfig::new().query("page", "2"),
        )
        .await
        .unwrap();

    assert_eq!(value, Some(json!({"items": []})));
}

#[tokio::test]
async fn test_no_content_yields_none() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync/start"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let value = client
        .request_value(Method::POST, "/sync/start", RequestConfig::new())
        .await
        .unwrap();

    assert!(value.is_none());
}

#[tokio::test]
async fn test_post_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sync/ack"))
        .and(body_json(json!({"data": {"ack_keys": ["a"]}})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let response = client
        .post_with_config(
            "/sync/ack",
            RequestConfig::new().json(json!({"data": {"ack_keys": ["a"]}})),
        )
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 202);
}

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let value = client
        .request_value(Method::GET, "/flaky", RequestConfig::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client
        .get_with_config("/down", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 500, ref body } if body == "boom"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forbidden"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let err = client
        .get_with_config("/forbidden", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_rate_limited_retries_then_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let err = client
        .get_with_config("/busy", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimited { .. }));
}

#[tokio::test]
async fn test_request_override_disables_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/once"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let result = client
        .get_with_config("/once", RequestConfig::new().retry(RetryPolicy::no_retry()))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = client_for(&server, 1);
    let err = client
        .get_with_config(
            "/slow",
            RequestConfig::new().timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 50 }));
}

#[tokio::test]
async fn test_retry_after_is_capped_by_max_backoff() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow-down"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/slow-down"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, 2);
    let started = std::time::Instant::now();
    let value = client
        .request_value(Method::GET, "/slow-down", RequestConfig::new())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(value["ok"], true);
    assert!(started.elapsed() < Duration::from_secs(5));
}
