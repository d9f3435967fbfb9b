//! Metric specifications - what to query and how to interpret the answer.

/// How a raw sample value is scaled before rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScaleMode {
    /// Sample used as-is (x1). Suits up/down probes that report 0 or 1.
    #[default]
    Raw,
    /// Sample multiplied by 100. Suits ratios such as a 0.0-1.0 energy share.
    #[cfg_attr(feature = "serde", serde(alias = "percentage"))]
    Percent,
}

impl ScaleMode {
    /// Multiplier applied to the sample.
    pub const fn factor(&self) -> f64 {
        match self {
            ScaleMode::Raw => 1.0,
            ScaleMode::Percent => 100.0,
        }
    }

    /// Scale a sample value.
    pub fn apply(&self, sample: f64) -> f64 {
        sample * self.factor()
    }

    /// Scale a sample and round it to the nearest integer.
    ///
    /// Returns `None` for NaN and infinities.
    pub fn scale_and_round(&self, sample: f64) -> Option<i64> {
        round_half_away(self.apply(sample))
    }
}

/// How a rounded value is mapped onto a [`Status`](crate::Status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ClassificationMode {
    /// `1` is up, `0` is down, anything else is unknown.
    #[default]
    Binary,
    /// Low/mid/high bands against [`BandThresholds`](crate::BandThresholds).
    Banded,
}

/// A single query expression to poll, with a human readable label.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSpec {
    /// PromQL expression, e.g. `up{job="node"}`.
    pub name: String,

    /// Label shown next to the status.
    pub description: String,

    /// Scaling applied to the returned sample.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scale: ScaleMode,

    /// How the scaled value is classified.
    #[cfg_attr(feature = "serde", serde(default))]
    pub classification: ClassificationMode,
}

impl MetricSpec {
    /// Create a raw, binary-classified spec.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            scale: ScaleMode::default(),
            classification: ClassificationMode::default(),
        }
    }

    /// Create a percentage spec classified into bands.
    pub fn percentage(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description)
            .with_scale(ScaleMode::Percent)
            .with_classification(ClassificationMode::Banded)
    }

    /// Set the scale mode.
    pub fn with_scale(mut self, scale: ScaleMode) -> Self {
        self.scale = scale;
        self
    }

    /// Set the classification mode.
    pub fn with_classification(mut self, classification: ClassificationMode) -> Self {
        self.classification = classification;
        self
    }
}

/// Round to the nearest integer, with halves rounded away from zero.
///
/// `2.5` becomes `3` and `-2.5` becomes `-3`. Non-finite input yields `None`;
/// finite values beyond the `i64` range saturate.
pub fn round_half_away(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    // f64::round already rounds half away from zero.
    Some(value.round() as i64)
}
