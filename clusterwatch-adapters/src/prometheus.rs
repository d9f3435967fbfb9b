//! Prometheus adapter using the HTTP instant-query API.
//!
//! Each [`MetricSpec`] is evaluated with one `GET /api/v1/query` call at the
//! current wall-clock time. The first sample of the returned vector is scaled
//! by the metric's [`ScaleMode`](clusterwatch_types::ScaleMode) and rounded half away from zero.
//!
//! ## Example
//!
//! ```rust,no_run
//! use clusterwatch_adapters::prometheus::PrometheusClient;
//! use clusterwatch_adapters::credentials::StaticCredentials;
//! use clusterwatch_types::MetricSpec;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("https://prometheus.example.com")
//!         .credentials(StaticCredentials::new("agent", "secret"))
//!         .build()?;
//!
//!     let value = client.query(&MetricSpec::new(r#"up{job="node"}"#, "Node")).await?;
//!     println!("node is {}", if value == 1 { "up" } else { "down" });
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use clusterwatch_types::MetricSpec;

use crate::credentials::CredentialProvider;
use crate::AdapterError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for a Prometheus-compatible query API.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    client: Client,
    endpoint: String,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl PrometheusClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> PrometheusClientBuilder {
        PrometheusClientBuilder::default()
    }

    /// The configured base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Evaluate the spec's expression now and return the scaled, rounded value.
    pub async fn query(&self, spec: &MetricSpec) -> Result<i64, AdapterError> {
        let sample = self.query_sample(&spec.name, SystemTime::now()).await?;
        spec.scale.scale_and_round(sample).ok_or_else(|| {
            AdapterError::Query(format!("non-finite sample {} for {}", sample, spec.name))
        })
    }

    /// Evaluate an expression at the given instant and return the raw first sample.
    pub async fn query_sample(&self, expr: &str, at: SystemTime) -> Result<f64, AdapterError> {
        if self.endpoint.trim().is_empty() {
            return Err(AdapterError::Config(
                "Prometheus endpoint is not set".to_string(),
            ));
        }

        let url = format!("{}/api/v1/query", self.endpoint.trim_end_matches('/'));
        let time = format_time(at);

        let mut request = self
            .client
            .get(&url)
            .query(&[("query", expr), ("time", time.as_str())]);

        if let Some(provider) = &self.credentials {
            let provider = Arc::clone(provider);
            let creds = tokio::task::spawn_blocking(move || provider.credentials())
                .await
                .map_err(|e| {
                    AdapterError::Credentials(format!("credential lookup failed: {}", e))
                })??;
            request = request.basic_auth(creds.username, Some(creds.password));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AdapterError::Auth(format!("API returned status {}", status)));
        }

        let body = response.bytes().await?;

        match serde_json::from_slice::<ApiResponse>(&body) {
            Ok(api) => api.into_sample(expr),
            Err(_) if !status.is_success() => Err(AdapterError::Query(format!(
                "API returned status {}",
                status
            ))),
            Err(e) => Err(AdapterError::Parse(e.to_string())),
        }
    }
}

/// Builder for PrometheusClient.
#[derive(Debug, Default)]
pub struct PrometheusClientBuilder {
    endpoint: Option<String>,
    timeout: Option<Duration>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    accept_invalid_certs: bool,
}

impl PrometheusClientBuilder {
    /// Set the base URL (e.g., "http://localhost:9090").
    ///
    /// An empty endpoint is accepted here and rejected on every query.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach Basic-Auth credentials from a provider, consulted on every query.
    pub fn credentials(self, provider: impl CredentialProvider + 'static) -> Self {
        self.credential_provider(Arc::new(provider))
    }

    /// Attach a shared credential provider.
    pub fn credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Skip TLS certificate verification.
    ///
    /// This makes the connection vulnerable to interception and is off by
    /// default.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PrometheusClient, AdapterError> {
        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);

        if self.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for Prometheus queries");
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| AdapterError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(PrometheusClient {
            client,
            endpoint: self.endpoint.unwrap_or_default(),
            credentials: self.credentials,
        })
    }
}

/// Format an instant the way the query API expects: Unix seconds with
/// millisecond precision.
fn format_time(at: SystemTime) -> String {
    let secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    format!("{:.3}", secs)
}

/// Envelope returned by every Prometheus API endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default, rename = "errorType")]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    result: serde_json::Value,
}

/// One series of an instant vector: labels plus `[timestamp, "value"]`.
#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

impl ApiResponse {
    fn into_sample(self, expr: &str) -> Result<f64, AdapterError> {
        if self.status != "success" {
            return Err(AdapterError::Query(format!(
                "{}: {}",
                self.error_type.as_deref().unwrap_or("error"),
                self.error.as_deref().unwrap_or("unknown error")
            )));
        }

        for warning in &self.warnings {
            tracing::debug!(query = expr, "Prometheus warning: {}", warning);
        }

        let data = self
            .data
            .ok_or_else(|| AdapterError::Parse("response has no data".to_string()))?;

        if data.result_type != "vector" {
            return Err(AdapterError::Query(format!(
                "unexpected result type '{}', expected vector",
                data.result_type
            )));
        }

        let samples: Vec<VectorSample> =
            serde_json::from_value(data.result).map_err(|e| AdapterError::Parse(e.to_string()))?;

        let first = samples
            .first()
            .ok_or_else(|| AdapterError::NoData(expr.to_string()))?;

        if samples.len() > 1 {
            tracing::debug!(
                query = expr,
                series = samples.len(),
                "Query returned several series, using {:?}",
                first.metric
            );
        }

        first
            .value
            .1
            .parse::<f64>()
            .map_err(|e| AdapterError::Parse(format!("sample '{}': {}", first.value.1, e)))
    }
}
