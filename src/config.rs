//! Startup configuration.
//!
//! Configuration is resolved once, in this order (later wins):
//!
//! 1. Built-in defaults
//! 2. An optional settings file (`clusterwatch.toml`, `.yaml` or `.json`)
//! 3. `CLUSTERWATCH_*` environment variables (e.g. `CLUSTERWATCH_BAND_LOW`)
//! 4. The well-known variables `PROMETHEUS_URL`, `PULL_DURATION`,
//!    `PROMETHEUS_USERNAME` and `PROMETHEUS_PASSWORD`
//!
//! Metrics come either from an inline `metrics` list in the settings file or
//! from a JSON manifest (default `metrics.json`) of `{name, description}`
//! objects. A missing or malformed manifest aborts startup.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clusterwatch_adapters::credentials::{Credentials, RefreshPolicy};
use clusterwatch_types::{BandThresholds, ClassificationMode, MetricSpec, ScaleMode};
use config::{Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Poll period used when `PULL_DURATION` is absent or not a number.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(60);

/// Shortest poll period accepted; smaller values are raised to this.
pub const MIN_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Default per-query timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Manifest loaded when none is configured.
pub const DEFAULT_MANIFEST: &str = "metrics.json";

/// Base name of the optional settings file, extension picked by the loader.
pub const DEFAULT_SETTINGS_FILE: &str = "clusterwatch";

/// Prefix for the extended environment variables.
pub const ENV_PREFIX: &str = "CLUSTERWATCH";

/// Errors raised while loading configuration. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings: {0}")]
    Source(#[from] config::ConfigError),

    #[error("error loading metrics from {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing metrics in {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fully resolved configuration, read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prometheus base URL. May be empty; every query then fails with a
    /// configuration error.
    pub endpoint: String,
    /// Delay between the end of one poll cycle and the start of the next.
    pub poll_period: Duration,
    /// Metrics to poll, in display order.
    pub metrics: Vec<MetricSpec>,
    /// Optional Basic-Auth credentials.
    pub credentials: Option<Credentials>,
    /// How long fetched credentials are reused.
    pub credential_refresh: RefreshPolicy,
    /// Thresholds for banded metrics.
    pub thresholds: BandThresholds,
    /// Per-query timeout.
    pub timeout: Duration,
    /// Skip TLS certificate verification.
    pub insecure_skip_verify: bool,
    /// Issue the queries of one cycle concurrently.
    pub concurrent: bool,
}

impl Config {
    /// Configuration with fixed metrics and default settings.
    ///
    /// This is the "hard-coded expressions" style: no files or environment
    /// are consulted.
    pub fn new(endpoint: impl Into<String>, metrics: Vec<MetricSpec>) -> Self {
        Self {
            endpoint: endpoint.into(),
            poll_period: DEFAULT_POLL_PERIOD,
            metrics,
            credentials: None,
            credential_refresh: RefreshPolicy::EveryRequest,
            thresholds: BandThresholds::default(),
            timeout: DEFAULT_TIMEOUT,
            insecure_skip_verify: false,
            concurrent: false,
        }
    }

    pub fn with_poll_period(mut self, period: Duration) -> Self {
        self.poll_period = period.max(MIN_POLL_PERIOD);
        self
    }
}

/// Load configuration from the default settings file, the process
/// environment, and the default manifest.
pub fn load() -> Result<Config, ConfigError> {
    ConfigLoader::new().load()
}

/// Builder for loading a [`Config`] from non-default locations.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    settings_file: Option<PathBuf>,
    manifest: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this settings file instead of the optional default. The file must exist.
    pub fn settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_file = Some(path.into());
        self
    }

    /// Load metrics from this manifest, ignoring any configured in settings.
    pub fn manifest(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest = Some(path.into());
        self
    }

    /// Read variables from this map instead of the process environment.
    pub fn env_source(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    pub fn load(self) -> Result<Config, ConfigError> {
        let env = self.env.unwrap_or_else(|| std::env::vars().collect());

        let file = match &self.settings_file {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let mut builder = config::Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX).source(Some(env.clone())),
        );

        for (key, var) in [
            ("prometheus_url", "PROMETHEUS_URL"),
            ("pull_duration", "PULL_DURATION"),
            ("username", "PROMETHEUS_USERNAME"),
            ("password", "PROMETHEUS_PASSWORD"),
        ] {
            builder = builder.set_override_option(key, env.get(var).cloned())?;
        }

        let raw: RawSettings = builder.build()?.try_deserialize()?;
        raw.resolve(self.manifest)
    }
}

/// One entry of the metrics manifest.
#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    name: String,
    description: String,
    #[serde(default)]
    scale: Option<ScaleMode>,
    #[serde(default)]
    classification: Option<ClassificationMode>,
}

impl ManifestEntry {
    fn into_spec(self, scale: ScaleMode, classification: ClassificationMode) -> MetricSpec {
        MetricSpec::new(self.name, self.description)
            .with_scale(self.scale.unwrap_or(scale))
            .with_classification(self.classification.unwrap_or(classification))
    }
}

/// Settings as read from file and environment, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    prometheus_url: Option<String>,
    pull_duration: Option<String>,
    manifest: Option<PathBuf>,
    metrics: Option<Vec<ManifestEntry>>,
    scale: Option<ScaleMode>,
    classification: Option<ClassificationMode>,
    band_low: Option<i64>,
    band_high: Option<i64>,
    timeout_secs: Option<u64>,
    insecure_skip_verify: Option<bool>,
    concurrent: Option<bool>,
    username: Option<String>,
    password: Option<String>,
    credential_ttl_secs: Option<u64>,
}

impl RawSettings {
    fn resolve(self, manifest_override: Option<PathBuf>) -> Result<Config, ConfigError> {
        let scale = self.scale.unwrap_or_default();
        let classification = self.classification.unwrap_or_default();

        let entries = match (manifest_override, self.metrics) {
            (Some(path), _) => load_manifest(&path)?,
            (None, Some(inline)) => inline,
            (None, None) => {
                let path = self
                    .manifest
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));
                load_manifest(&path)?
            }
        };
        if entries.is_empty() {
            warn!("No metrics configured, every poll cycle will be empty");
        }
        let metrics = entries
            .into_iter()
            .map(|e| e.into_spec(scale, classification))
            .collect();

        let defaults = BandThresholds::default();
        let thresholds = BandThresholds {
            low: self.band_low.unwrap_or(defaults.low),
            high: self.band_high.unwrap_or(defaults.high),
        };
        if thresholds.low > thresholds.high {
            return Err(ConfigError::Invalid(format!(
                "band_low ({}) must not exceed band_high ({})",
                thresholds.low, thresholds.high
            )));
        }

        let timeout = match self.timeout_secs {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "timeout_secs must be positive".to_string(),
                ))
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_TIMEOUT,
        };

        let credentials = match (self.username, self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "username and password must be set together".to_string(),
                ))
            }
        };

        let credential_refresh = match self.credential_ttl_secs {
            None | Some(0) => RefreshPolicy::EveryRequest,
            Some(secs) => RefreshPolicy::Ttl(Duration::from_secs(secs)),
        };

        Ok(Config {
            endpoint: self.prometheus_url.unwrap_or_default(),
            poll_period: parse_poll_period(self.pull_duration.as_deref()),
            metrics,
            credentials,
            credential_refresh,
            thresholds,
            timeout,
            insecure_skip_verify: self.insecure_skip_verify.unwrap_or(false),
            concurrent: self.concurrent.unwrap_or(false),
        })
    }
}

/// Interpret `PULL_DURATION` (whole seconds).
///
/// Absent or non-numeric values give [`DEFAULT_POLL_PERIOD`]; zero and
/// negative values are raised to [`MIN_POLL_PERIOD`].
pub fn parse_poll_period(raw: Option<&str>) -> Duration {
    match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(secs)) if secs >= MIN_POLL_PERIOD.as_secs() as i64 => {
            Duration::from_secs(secs as u64)
        }
        Some(Ok(secs)) => {
            warn!(
                "PULL_DURATION={} is not positive, using {}s",
                secs,
                MIN_POLL_PERIOD.as_secs()
            );
            MIN_POLL_PERIOD
        }
        _ => DEFAULT_POLL_PERIOD,
    }
}

fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::ManifestParse {
        path: path.to_path_buf(),
        source,
    })
}
