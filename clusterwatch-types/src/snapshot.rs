//! StatusSnapshot - the result of one poll cycle.

use crate::{aggregate, MetricReading, Severity, Status};

/// Everything a display needs to render one poll cycle.
///
/// Snapshots are immutable once built. A display keeps only the latest one;
/// there is no history.
///
/// # Example
///
/// ```rust
/// use clusterwatch_types::{BandThresholds, MetricReading, MetricSpec, Severity, StatusSnapshot};
///
/// let t = BandThresholds::default();
/// let snapshot = StatusSnapshot::new(
///     false,
///     vec![MetricReading::new(MetricSpec::new("up", "Node"), Ok(1), &t)],
/// );
/// assert_eq!(snapshot.severity, Severity::Ok);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Whether the local time was within the night window at snapshot time.
    pub night: bool,

    /// One reading per configured metric, in configuration order.
    pub readings: Vec<MetricReading>,

    /// Aggregated severity of `readings`.
    pub severity: Severity,
}

impl StatusSnapshot {
    /// Create a snapshot with the current timestamp.
    pub fn new(night: bool, readings: Vec<MetricReading>) -> Self {
        Self::with_timestamp(current_timestamp_ms(), night, readings)
    }

    /// Create a snapshot with a specific timestamp.
    pub fn with_timestamp(timestamp_ms: u64, night: bool, readings: Vec<MetricReading>) -> Self {
        let severity = aggregate(&readings);
        Self {
            timestamp_ms,
            night,
            readings,
            severity,
        }
    }

    /// Number of readings in the snapshot.
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Number of readings that failed.
    pub fn error_count(&self) -> usize {
        self.readings.iter().filter(|r| r.is_error()).count()
    }

    /// Number of readings that are down or in the low band.
    pub fn failing_count(&self) -> usize {
        self.readings
            .iter()
            .filter(|r| r.status.is_failing())
            .count()
    }

    /// Readings with the given status.
    pub fn with_status(&self, status: Status) -> impl Iterator<Item = &MetricReading> {
        self.readings.iter().filter(move |r| r.status == status)
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
