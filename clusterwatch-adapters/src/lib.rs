//! # clusterwatch-adapters
//!
//! Collectors that turn a [`MetricSpec`] into a number, plus the credential
//! providers they authenticate with.
//!
//! ## Supported Systems
//!
//! - **Prometheus** (`prometheus` feature) - Instant queries against any
//!   Prometheus-compatible `/api/v1/query` endpoint, optionally with Basic-Auth
//!
//! ## Quick Start (Prometheus)
//!
//! ```rust,no_run
//! use clusterwatch_adapters::prometheus::PrometheusClient;
//! use clusterwatch_types::MetricSpec;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("http://localhost:9090")
//!         .timeout(Duration::from_secs(10))
//!         .build()?;
//!
//!     let share = MetricSpec::percentage("green_energy_ratio", "Green energy");
//!     println!("{}%", client.query(&share).await?);
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;

#[cfg(feature = "prometheus")]
pub mod prometheus;

pub use credentials::{CredentialProvider, Credentials};
pub use error::AdapterError;

// Re-export types for convenience
pub use clusterwatch_types::{ErrorKind, MetricSpec, ReadingError};
