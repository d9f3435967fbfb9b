//! HTTP-level tests for the Prometheus client against a mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clusterwatch_adapters::credentials::{
    CachedCredentials, CredentialProvider, Credentials, RefreshPolicy, StaticCredentials,
};
use clusterwatch_adapters::prometheus::PrometheusClient;
use clusterwatch_adapters::{AdapterError, ErrorKind, MetricSpec};
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vector(value: &str) -> serde_json::Value {
    json!({
        "status": "success",
        "data": {
            "resultType": "vector",
            "result": [
                { "metric": { "__name__": "up", "job": "node" }, "value": [1703160000.0, value] }
            ]
        }
    })
}

fn client(server: &MockServer) -> PrometheusClient {
    PrometheusClient::builder()
        .endpoint(server.uri())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_instant_query_returns_rounded_value() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(query_param("query", r#"up{job="node"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .expect(1)
        .mount(&server)
        .await;

    let value = client(&server)
        .query(&MetricSpec::new(r#"up{job="node"}"#, "Node"))
        .await
        .unwrap();
    assert_eq!(value, 1);
}

#[tokio::test]
async fn test_evaluation_time_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .mount(&server)
        .await;

    client(&server).query(&MetricSpec::new("up", "Up")).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let time = requests[0]
        .url
        .query_pairs()
        .find(|(k, _)| k == "time")
        .map(|(_, v)| v.into_owned())
        .unwrap();
    let secs: f64 = time.parse().unwrap();
    assert!(secs > 1_600_000_000.0);
}

#[tokio::test]
async fn test_percent_scale_rounds_half_away() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("0.625")))
        .mount(&server)
        .await;

    let value = client(&server)
        .query(&MetricSpec::percentage("green_ratio", "Green"))
        .await
        .unwrap();
    assert_eq!(value, 63);
}

#[tokio::test]
async fn test_trailing_slash_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("0")))
        .mount(&server)
        .await;

    let client = PrometheusClient::builder()
        .endpoint(format!("{}/", server.uri()))
        .build()
        .unwrap();
    assert_eq!(client.query(&MetricSpec::new("up", "Up")).await.unwrap(), 0);
}

#[tokio::test]
async fn test_basic_auth_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(basic_auth("agent", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .expect(2)
        .mount(&server)
        .await;

    let client = PrometheusClient::builder()
        .endpoint(server.uri())
        .credentials(CachedCredentials::new(
            StaticCredentials::new("agent", "s3cret"),
            RefreshPolicy::Never,
        ))
        .build()
        .unwrap();

    let spec = MetricSpec::new("up", "Up");
    assert_eq!(client.query(&spec).await.unwrap(), 1);
    assert_eq!(client.query(&spec).await.unwrap(), 1);
}

/// Counts lookups through a shared counter.
#[derive(Debug, Clone, Default)]
struct CountingCredentials {
    calls: Arc<AtomicUsize>,
}

impl CredentialProvider for CountingCredentials {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Credentials::new("agent", "s3cret"))
    }
}

#[derive(Debug)]
struct LockedVault;

impl CredentialProvider for LockedVault {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        Err(AdapterError::Credentials("vault is locked".into()))
    }
}

/// Blocks the calling thread like a password-manager lookup.
#[derive(Debug)]
struct SlowVault(Duration);

impl CredentialProvider for SlowVault {
    fn credentials(&self) -> Result<Credentials, AdapterError> {
        std::thread::sleep(self.0);
        Ok(Credentials::new("agent", "s3cret"))
    }
}

#[tokio::test]
async fn test_uncached_provider_is_asked_every_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/query"))
        .and(basic_auth("agent", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .expect(3)
        .mount(&server)
        .await;

    let provider = CountingCredentials::default();
    let calls = provider.calls.clone();
    let client = PrometheusClient::builder()
        .endpoint(server.uri())
        .credentials(CachedCredentials::new(provider, RefreshPolicy::EveryRequest))
        .build()
        .unwrap();

    let spec = MetricSpec::new("up", "Up");
    for _ in 0..3 {
        assert_eq!(client.query(&spec).await.unwrap(), 1);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failing_provider_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .mount(&server)
        .await;

    let client = PrometheusClient::builder()
        .endpoint(server.uri())
        .credentials(LockedVault)
        .build()
        .unwrap();

    let err = client.query(&MetricSpec::new("up", "Up")).await.unwrap_err();
    assert!(matches!(err, AdapterError::Credentials(_)));
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blocking_provider_does_not_stall_runtime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("1")))
        .mount(&server)
        .await;

    let client = PrometheusClient::builder()
        .endpoint(server.uri())
        .credentials(SlowVault(Duration::from_millis(500)))
        .build()
        .unwrap();

    let start = Instant::now();
    let ticker = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        start.elapsed()
    });

    assert_eq!(client.query(&MetricSpec::new("up", "Up")).await.unwrap(), 1);
    let ticked_after = ticker.await.unwrap();
    assert!(
        ticked_after < Duration::from_millis(400),
        "ticker ran after {:?}",
        ticked_after
    );
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("up", "Up"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Auth(_)));
    assert_eq!(err.kind(), ErrorKind::Query);
}

#[tokio::test]
async fn test_api_error_body_is_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "error",
            "errorType": "bad_data",
            "error": "invalid parameter \"query\": parse error"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("up{", "Broken"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Query(ref m) if m.starts_with("bad_data")));
}

#[tokio::test]
async fn test_server_error_without_body_is_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("up", "Up"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Query(ref m) if m.contains("503")));
}

#[tokio::test]
async fn test_empty_result_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "resultType": "vector", "result": [] }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("absent_metric", "Absent"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoData);
}

#[tokio::test]
async fn test_matrix_result_is_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "resultType": "matrix", "result": [] }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("up[5m]", "Range"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Query);
}

#[tokio::test]
async fn test_nan_sample_is_query_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vector("NaN")))
        .mount(&server)
        .await;

    let err = client(&server)
        .query(&MetricSpec::new("0/0", "NaN"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::Query(ref m) if m.contains("non-finite")));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vector("1"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = PrometheusClient::builder()
        .endpoint(server.uri())
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client.query(&MetricSpec::new("up", "Up")).await.unwrap_err();
    assert!(matches!(err, AdapterError::Timeout));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Port 9 (discard) is almost never listening locally.
    let client = PrometheusClient::builder()
        .endpoint("http://127.0.0.1:9")
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let err = client.query(&MetricSpec::new("up", "Up")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}
