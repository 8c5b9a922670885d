//! Integration tests using mock HTTP server
//!
//! Exercises the adapter end to end through the public API: configuration,
//! requests, failure mapping, shared authorization and disposal.

use http_adapter::{AdapterConfig, Error, HttpAdapter};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Request Scenarios
// ============================================================================

#[tokio::test]
async fn test_get_missing_resource() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let adapter = HttpAdapter::new(AdapterConfig::default()).unwrap();
    let err = adapter
        .get(&format!("{}/404", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::Request(e) => {
            assert_eq!(e.status_code, Some(404));
            assert_eq!(e.message, "Not Found");
            assert!(!e.timed_out);
        }
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_post_form_round_trip() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded; charset=utf-8",
        ))
        .and(body_string("x=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"ok\":true}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = HttpAdapter::new(AdapterConfig::default()).unwrap();
    let body = adapter
        .post(
            &format!("{}/submit", mock_server.uri()),
            "application/x-www-form-urlencoded",
            "x=1",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(body.text().await.unwrap(), "{\"ok\":true}");
}

#[tokio::test]
async fn test_delete_no_content() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/items/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let adapter = HttpAdapter::new(AdapterConfig::default()).unwrap();
    adapter
        .delete(
            &format!("{}/items/7", mock_server.uri()),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
}

// ============================================================================
// Timeout vs Cancellation
// ============================================================================

#[tokio::test]
async fn test_timeout_from_config() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = AdapterConfig::builder()
        .timeout(Duration::from_secs(1))
        .build();
    let adapter = HttpAdapter::new(config).unwrap();
    let url = mock_server.uri();

    let err = adapter
        .get(&url, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.timed_out());
    assert!(!err.is_cancelled());
    assert_eq!(err.to_string(), format!("Connection to {url} timed out"));
}

#[tokio::test]
async fn test_caller_cancellation_is_not_timeout() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let adapter = HttpAdapter::new(AdapterConfig::default()).unwrap();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = adapter
        .post(&mock_server.uri(), "text/plain", "slow", &token)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!err.timed_out());
}

// ============================================================================
// Shared State
// ============================================================================

#[tokio::test]
async fn test_shared_adapter_across_tasks() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(8)
        .mount(&mock_server)
        .await;

    let adapter = Arc::new(HttpAdapter::new(AdapterConfig::default()).unwrap());
    adapter.set_authorization_header("Bearer", "shared").unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let adapter = Arc::clone(&adapter);
        let url = mock_server.uri();
        handles.push(tokio::spawn(async move {
            let body = adapter.get(&url, &CancellationToken::new()).await?;
            body.text().await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "ok");
    }
}

#[tokio::test]
async fn test_dispose_then_request() {
    init_tracing();
    let adapter = HttpAdapter::new(AdapterConfig::default()).unwrap();

    adapter.dispose();
    adapter.dispose();

    let err = adapter
        .delete("http://127.0.0.1:9/items", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Disposed));
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test]
async fn test_adapter_from_yaml_file() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("accept", "text/csv"))
        .and(header("user-agent", "yaml-agent/0.1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "timeout_ms: 5000\nuser_agent: yaml-agent/0.1\ndefault_headers:\n  Accept: text/csv"
    )
    .unwrap();

    let config = AdapterConfig::from_file(file.path()).unwrap();
    let adapter = HttpAdapter::new(config).unwrap();

    adapter
        .get(&mock_server.uri(), &CancellationToken::new())
        .await
        .unwrap();
}
