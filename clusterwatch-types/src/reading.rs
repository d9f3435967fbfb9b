//! Per-metric readings produced by one poll cycle.

use core::fmt;

use crate::{classify, BandThresholds, MetricSpec, Status};

/// Why a metric could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Endpoint unset, credentials unavailable, or similar setup problem.
    Config,
    /// Network, TLS, or timeout failure.
    Transport,
    /// The server answered with an API error or an unexpected result shape.
    Query,
    /// The query succeeded but returned no samples.
    NoData,
}

impl ErrorKind {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Transport => "transport",
            ErrorKind::Query => "query",
            ErrorKind::NoData => "no data",
        }
    }
}

/// The failure recorded in a reading in place of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReadingError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ReadingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for ReadingError {}

/// The outcome of querying one metric during one poll cycle.
///
/// Readings are never persisted; a new set is produced every cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricReading {
    /// The spec that was queried.
    pub spec: MetricSpec,

    /// The rounded value, or why there is none.
    pub outcome: Result<i64, ReadingError>,

    /// Classification of `outcome` under the spec's mode.
    pub status: Status,
}

impl MetricReading {
    /// Build a reading and classify it.
    pub fn new(
        spec: MetricSpec,
        outcome: Result<i64, ReadingError>,
        thresholds: &BandThresholds,
    ) -> Self {
        let status = classify(&outcome, spec.classification, thresholds);
        Self {
            spec,
            outcome,
            status,
        }
    }

    /// The value, if the query succeeded.
    pub fn value(&self) -> Option<i64> {
        self.outcome.as_ref().ok().copied()
    }

    /// The error, if the query failed.
    pub fn error(&self) -> Option<&ReadingError> {
        self.outcome.as_ref().err()
    }

    pub fn is_error(&self) -> bool {
        self.outcome.is_err()
    }

    /// One-line summary, e.g. `API: UP` or `Green share: 57`.
    pub fn summary(&self) -> String {
        match (&self.outcome, self.status) {
            (Err(_), _) => format!("{}: unknown", self.spec.description),
            (Ok(value), Status::Unknown | Status::Band(_)) => {
                format!("{}: {}", self.spec.description, value)
            }
            (Ok(_), status) => format!("{}: {}", self.spec.description, status.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Band;

    #[test]
    fn test_exactly_one_of_value_or_error() {
        let t = BandThresholds::default();
        let ok = MetricReading::new(MetricSpec::new("up", "Up"), Ok(1), &t);
        assert_eq!(ok.value(), Some(1));
        assert!(ok.error().is_none());

        let failed = MetricReading::new(
            MetricSpec::new("up", "Up"),
            Err(ReadingError::new(ErrorKind::NoData, "no data for metric: up")),
            &t,
        );
        assert_eq!(failed.value(), None);
        assert_eq!(failed.error().map(|e| e.kind), Some(ErrorKind::NoData));
        assert_eq!(failed.status, Status::Unavailable);
    }

    #[test]
    fn test_summary_lines() {
        let t = BandThresholds::default();
        let up = MetricReading::new(MetricSpec::new("up", "API"), Ok(1), &t);
        assert_eq!(up.summary(), "API: UP");

        let odd = MetricReading::new(MetricSpec::new("up", "API"), Ok(7), &t);
        assert_eq!(odd.summary(), "API: 7");

        let share = MetricReading::new(MetricSpec::percentage("g", "Green"), Ok(57), &t);
        assert_eq!(share.status, Status::Band(Band::Mid));
        assert_eq!(share.summary(), "Green: 57");

        let failed = MetricReading::new(
            MetricSpec::new("up", "API"),
            Err(ReadingError::new(ErrorKind::Transport, "connection refused")),
            &t,
        );
        assert_eq!(failed.summary(), "API: unknown");
    }

    #[test]
    fn test_reading_error_display() {
        let err = ReadingError::new(ErrorKind::Query, "bad_data: parse error");
        assert_eq!(err.to_string(), "query error: bad_data: parse error");
    }
}
