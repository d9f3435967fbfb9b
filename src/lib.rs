//! # clusterwatch
//!
//! A headless status poller for Prometheus. On a fixed period it evaluates a
//! list of instant queries, classifies each result, rolls the results up into
//! one overall severity and hands an immutable snapshot to a display.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Poller                                │
//! │  ┌────────┐    ┌────────────┐    ┌───────────┐    ┌───────────┐  │
//! │  │ config │───▶│  source    │───▶│ classify  │───▶│   sink    │  │
//! │  │(startup)    │(Prometheus)│    │+ aggregate│    │ (display) │  │
//! │  └────────┘    └─────┬──────┘    └───────────┘    └───────────┘  │
//! │                      │                                           │
//! │                      ▼                                           │
//! │               ┌─────────────┐                                    │
//! │               │ credentials │◀── Static | Env | Cached           │
//! │               └─────────────┘                                    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`config`]**: settings file, environment and metrics manifest, resolved once
//! - **[`poller`]**: the poll loop and the [`MetricSource`] seam it queries through
//! - **[`sink`]**: the [`DisplaySink`] abstraction plus channel, log and file sinks
//!
//! Classification, aggregation and the snapshot model live in
//! `clusterwatch-types`; the HTTP client and credential providers live in
//! `clusterwatch-adapters`.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Poll every 30 seconds using ./metrics.json
//! PROMETHEUS_URL=http://prometheus:9090 PULL_DURATION=30 clusterwatch
//!
//! # One cycle, print JSON, exit with the severity as status code
//! clusterwatch --once
//! ```
//!
//! ### As a library feeding a display task
//!
//! ```no_run
//! use std::sync::Arc;
//! use clusterwatch::{ChannelSink, Config, MetricSpec, Poller, PrometheusClient};
//!
//! # tokio_test::block_on(async {
//! let config = Config::new(
//!     "http://localhost:9090",
//!     vec![MetricSpec::new(r#"up{job="api"}"#, "API")],
//! );
//! let client = PrometheusClient::builder()
//!     .endpoint(config.endpoint.clone())
//!     .build()
//!     .unwrap();
//!
//! let (sink, mut receiver) = ChannelSink::create();
//! let handle = Poller::new(Arc::new(config), client).spawn(sink);
//!
//! if let Some(snapshot) = receiver.changed().await {
//!     println!("{}", snapshot.severity.label());
//! }
//! handle.stop().await.unwrap();
//! # });
//! ```

pub mod config;
pub mod poller;
pub mod sink;

use tracing_subscriber::EnvFilter;

pub use clusterwatch_adapters::credentials::{
    CachedCredentials, CredentialProvider, Credentials, EnvCredentials, RefreshPolicy,
    StaticCredentials,
};
pub use clusterwatch_adapters::prometheus::PrometheusClient;
pub use clusterwatch_adapters::AdapterError;
pub use clusterwatch_types::{
    aggregate, Band, BandThresholds, ClassificationMode, ErrorKind, MetricReading, MetricSpec,
    ReadingError, ScaleMode, Severity, Status, StatusSnapshot,
};
pub use config::{Config, ConfigError, ConfigLoader};
pub use poller::{MetricSource, Poller, PollerHandle};
pub use sink::{ChannelSink, DisplaySink, FileSink, LogSink, MultiSink, SnapshotReceiver};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` for this crate
/// when `verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,clusterwatch=debug,clusterwatch_adapters=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
