//! # clusterwatch-types
//!
//! Core types for clusterwatch. This crate defines what gets polled (a
//! [`MetricSpec`]), what a single poll produced (a [`MetricReading`]) and the
//! immutable [`StatusSnapshot`] handed to a display once per poll cycle.
//!
//! It also holds the pure logic that turns raw numbers into statuses:
//!
//! - **Scaling and rounding**: [`ScaleMode`] and [`round_half_away`]
//! - **Classification**: binary up/down probes and banded percentage metrics
//! - **Aggregation**: worst case wins, any failed reading forces [`Severity::Unknown`]
//! - **Night detection**: [`is_night`] for dimming a display after 21:00
//!
//! Nothing in here performs I/O, so every rule can be tested in isolation.
//!
//! ## Features
//!
//! - `serde`: JSON/etc. serialization of all model types via serde
//!
//! ## Example
//!
//! ```rust
//! use clusterwatch_types::{
//!     BandThresholds, ClassificationMode, MetricReading, MetricSpec, Severity, StatusSnapshot,
//! };
//!
//! let thresholds = BandThresholds::default();
//! let api = MetricSpec::new(r#"up{job="api"}"#, "API");
//! let db = MetricSpec::new(r#"up{job="db"}"#, "Database");
//! assert_eq!(api.classification, ClassificationMode::Binary);
//!
//! let readings = vec![
//!     MetricReading::new(api, Ok(1), &thresholds),
//!     MetricReading::new(db, Ok(0), &thresholds),
//! ];
//!
//! let snapshot = StatusSnapshot::with_timestamp(1_703_160_000_000, false, readings);
//! assert_eq!(snapshot.severity, Severity::Degraded);
//! ```

mod classify;
mod night;
mod palette;
mod reading;
mod snapshot;
mod spec;

pub use classify::*;
pub use night::*;
pub use palette::*;
pub use reading::*;
pub use snapshot::*;
pub use spec::*;
