//! Status classification and aggregation.
//!
//! Every function here is pure: a status depends only on the value and the
//! configured mode, and the overall severity depends only on the readings.

use crate::{ClassificationMode, MetricReading, ReadingError};

/// Thresholds for banded classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandThresholds {
    /// Upper bound (inclusive) of the low band.
    pub low: i64,
    /// Upper bound (inclusive) of the mid band.
    pub high: i64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self { low: 40, high: 80 }
    }
}

/// Band of a continuous percentage metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Band {
    Low,
    Mid,
    High,
}

impl Band {
    pub fn label(&self) -> &'static str {
        match self {
            Band::Low => "LOW",
            Band::Mid => "MID",
            Band::High => "HIGH",
        }
    }
}

/// Classified status of a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Binary probe reported `1`.
    Up,
    /// Binary probe reported `0`.
    Down,
    /// Binary probe reported something other than `0` or `1`.
    Unknown,
    /// Banded metric.
    Band(Band),
    /// The query failed; there is no value to classify.
    Unavailable,
}

impl Status {
    /// Whether this status counts towards degraded/critical severity.
    pub fn is_failing(&self) -> bool {
        matches!(self, Status::Down | Status::Band(Band::Low))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Up => "UP",
            Status::Down => "DOWN",
            Status::Unknown => "UNKNOWN",
            Status::Band(band) => band.label(),
            Status::Unavailable => "UNAVAILABLE",
        }
    }

    /// Glyph shown next to the reading.
    pub fn icon(&self) -> &'static str {
        match self {
            Status::Up | Status::Band(Band::High) => "✅",
            Status::Down | Status::Band(Band::Low) => "❌",
            Status::Band(Band::Mid) => "⚠️",
            Status::Unknown | Status::Unavailable => "❓",
        }
    }
}

/// Binary classification: `1` is up, `0` is down, any other value is unknown.
pub fn classify_binary(value: i64) -> Status {
    match value {
        1 => Status::Up,
        0 => Status::Down,
        _ => Status::Unknown,
    }
}

/// Banded classification.
///
/// `0 < value <= low` is [`Band::Low`], `low < value <= high` is [`Band::Mid`],
/// and everything else is [`Band::High`]. Zero and negative values are never
/// treated as low.
pub fn classify_banded(value: i64, thresholds: &BandThresholds) -> Band {
    if value > 0 && value <= thresholds.low {
        Band::Low
    } else if value > thresholds.low && value <= thresholds.high {
        Band::Mid
    } else {
        Band::High
    }
}

/// Classify a query outcome under the given mode.
pub fn classify(
    outcome: &Result<i64, ReadingError>,
    mode: ClassificationMode,
    thresholds: &BandThresholds,
) -> Status {
    match (outcome, mode) {
        (Err(_), _) => Status::Unavailable,
        (Ok(value), ClassificationMode::Binary) => classify_binary(*value),
        (Ok(value), ClassificationMode::Banded) => {
            Status::Band(classify_banded(*value, thresholds))
        }
    }
}

/// Overall system severity, worst case wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Ok,
    Degraded,
    Critical,
    /// At least one reading failed. Takes precedence over everything else.
    Unknown,
}

impl Severity {
    /// Returns a short symbol for display.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Ok => "OK",
            Severity::Degraded => "DEGRADED",
            Severity::Critical => "CRITICAL",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

/// Combine per-metric readings into one severity.
///
/// Any failed reading yields [`Severity::Unknown`]. Otherwise the number of
/// down/low readings decides: none is OK, one is degraded, two or more is
/// critical. An empty set of readings is OK.
pub fn aggregate(readings: &[MetricReading]) -> Severity {
    if readings.iter().any(MetricReading::is_error) {
        return Severity::Unknown;
    }

    match readings.iter().filter(|r| r.status.is_failing()).count() {
        0 => Severity::Ok,
        1 => Severity::Degraded,
        _ => Severity::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, MetricSpec};

    fn reading(value: i64) -> MetricReading {
        MetricReading::new(
            MetricSpec::new("up", "probe"),
            Ok(value),
            &BandThresholds::default(),
        )
    }

    fn banded(value: i64) -> MetricReading {
        MetricReading::new(
            MetricSpec::percentage("share", "share"),
            Ok(value),
            &BandThresholds::default(),
        )
    }

    fn failed() -> MetricReading {
        MetricReading::new(
            MetricSpec::new("up", "probe"),
            Err(ReadingError::new(ErrorKind::Transport, "timed out")),
            &BandThresholds::default(),
        )
    }

    #[test]
    fn test_binary_classification() {
        for v in -50..=50 {
            let expected = match v {
                1 => Status::Up,
                0 => Status::Down,
                _ => Status::Unknown,
            };
            assert_eq!(classify_binary(v), expected, "value {}", v);
        }
        assert_eq!(classify_binary(i64::MAX), Status::Unknown);
        assert_eq!(classify_binary(i64::MIN), Status::Unknown);
    }

    #[test]
    fn test_banded_classification() {
        let t = BandThresholds::default();
        for v in 1..=40 {
            assert_eq!(classify_banded(v, &t), Band::Low, "value {}", v);
        }
        for v in 41..=80 {
            assert_eq!(classify_banded(v, &t), Band::Mid, "value {}", v);
        }
        for v in [81, 100, 250, i64::MAX] {
            assert_eq!(classify_banded(v, &t), Band::High, "value {}", v);
        }
    }

    #[test]
    fn test_banded_zero_and_negative_are_high() {
        let t = BandThresholds::default();
        for v in [0, -1, -40, -100, i64::MIN] {
            assert_eq!(classify_banded(v, &t), Band::High, "value {}", v);
        }
    }

    #[test]
    fn test_banded_custom_thresholds() {
        let t = BandThresholds { low: 10, high: 20 };
        assert_eq!(classify_banded(10, &t), Band::Low);
        assert_eq!(classify_banded(11, &t), Band::Mid);
        assert_eq!(classify_banded(21, &t), Band::High);
    }

    #[test]
    fn test_failed_outcome_is_unavailable_in_both_modes() {
        let err = Err(ReadingError::new(ErrorKind::NoData, "empty"));
        let t = BandThresholds::default();
        assert_eq!(
            classify(&err, ClassificationMode::Binary, &t),
            Status::Unavailable
        );
        assert_eq!(
            classify(&err, ClassificationMode::Banded, &t),
            Status::Unavailable
        );
        // Distinct from the numeric unknown case
        assert_ne!(
            classify(&Ok(5), ClassificationMode::Binary, &t),
            Status::Unavailable
        );
    }

    #[test]
    fn test_aggregate_counts_down() {
        assert_eq!(aggregate(&[]), Severity::Ok);
        assert_eq!(aggregate(&[reading(1), reading(1), reading(1)]), Severity::Ok);
        assert_eq!(
            aggregate(&[reading(1), reading(0), reading(1)]),
            Severity::Degraded
        );
        assert_eq!(
            aggregate(&[reading(0), reading(1), reading(0)]),
            Severity::Critical
        );
        assert_eq!(
            aggregate(&[reading(0), reading(0), reading(0)]),
            Severity::Critical
        );
    }

    #[test]
    fn test_aggregate_numeric_unknown_does_not_count() {
        assert_eq!(aggregate(&[reading(1), reading(7)]), Severity::Ok);
        assert_eq!(aggregate(&[reading(0), reading(-3)]), Severity::Degraded);
    }

    #[test]
    fn test_aggregate_counts_low_bands() {
        assert_eq!(aggregate(&[banded(90), banded(60)]), Severity::Ok);
        assert_eq!(aggregate(&[banded(30), banded(60)]), Severity::Degraded);
        assert_eq!(aggregate(&[banded(30), banded(5)]), Severity::Critical);
        assert_eq!(aggregate(&[banded(0), banded(-5)]), Severity::Ok);
        assert_eq!(aggregate(&[banded(30), reading(0)]), Severity::Critical);
    }

    #[test]
    fn test_aggregate_is_order_independent() {
        let a = [reading(0), reading(1), banded(20), reading(1)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(aggregate(&a), aggregate(&b));
        assert_eq!(aggregate(&a), Severity::Critical);
    }

    #[test]
    fn test_aggregate_error_takes_precedence() {
        assert_eq!(aggregate(&[failed()]), Severity::Unknown);
        assert_eq!(aggregate(&[reading(1), failed(), reading(1)]), Severity::Unknown);
        assert_eq!(
            aggregate(&[reading(0), reading(0), failed()]),
            Severity::Unknown
        );
    }
}
