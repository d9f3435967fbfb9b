//! The poll loop.
//!
//! One long-lived task alternates between two states:
//!
//! ```text
//!        ┌──────────────────────────────────────────────┐
//!        ▼                                              │
//!   ┌─────────┐   query every metric, aggregate,   ┌────┴────┐
//!   │ POLLING │ ─────── deliver snapshot ────────▶ │  IDLE   │
//!   └─────────┘                                    │ (sleep) │
//!                                                  └─────────┘
//! ```
//!
//! A failed query becomes an unavailable reading for that cycle only. There is
//! no retry and no backoff: the next scheduled cycle is the retry.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use clusterwatch_adapters::prometheus::PrometheusClient;
use clusterwatch_types::{is_night_now, MetricReading, MetricSpec, ReadingError, StatusSnapshot};

use crate::config::Config;
use crate::sink::DisplaySink;

/// Something that can evaluate a metric spec to a number.
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn query(&self, spec: &MetricSpec) -> Result<i64, ReadingError>;
}

#[async_trait]
impl MetricSource for PrometheusClient {
    async fn query(&self, spec: &MetricSpec) -> Result<i64, ReadingError> {
        PrometheusClient::query(self, spec)
            .await
            .map_err(ReadingError::from)
    }
}

#[async_trait]
impl<S: MetricSource + ?Sized> MetricSource for Arc<S> {
    async fn query(&self, spec: &MetricSpec) -> Result<i64, ReadingError> {
        (**self).query(spec).await
    }
}

/// Drives poll cycles for one configuration.
pub struct Poller<S> {
    config: Arc<Config>,
    source: S,
    night: fn() -> bool,
}

impl<S: MetricSource> Poller<S> {
    pub fn new(config: Arc<Config>, source: S) -> Self {
        Self {
            config,
            source,
            night: is_night_now,
        }
    }

    /// Replace the night check (local wall-clock time by default).
    pub fn with_night_check(mut self, night: fn() -> bool) -> Self {
        self.night = night;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one poll cycle and return its snapshot.
    ///
    /// Readings are in configuration order whether queries run one after
    /// another or concurrently.
    pub async fn collect(&self) -> StatusSnapshot {
        let metrics = &self.config.metrics;

        let readings = if self.config.concurrent {
            join_all(metrics.iter().map(|spec| self.read(spec))).await
        } else {
            let mut readings = Vec::with_capacity(metrics.len());
            for spec in metrics {
                readings.push(self.read(spec).await);
            }
            readings
        };

        let snapshot = StatusSnapshot::new((self.night)(), readings);
        info!(
            severity = snapshot.severity.label(),
            failing = snapshot.failing_count(),
            errors = snapshot.error_count(),
            "Polled {} metrics",
            snapshot.len()
        );
        snapshot
    }

    async fn read(&self, spec: &MetricSpec) -> MetricReading {
        let outcome = self.source.query(spec).await;
        let reading = MetricReading::new(spec.clone(), outcome, &self.config.thresholds);

        match &reading.outcome {
            Ok(value) => debug!(
                metric = %spec.description,
                value,
                "{} ({})",
                reading.status.label(),
                spec.name
            ),
            Err(e) => debug!(metric = %spec.description, "error - {}", e),
        }

        reading
    }

    /// Poll forever, delivering every snapshot to `sink`.
    ///
    /// Returns only if the sink asks to stop.
    pub async fn run<D: DisplaySink + ?Sized>(&self, sink: &mut D) {
        let (_keep_alive, stop) = watch::channel(false);
        self.run_until(sink, stop).await;
    }

    /// Poll until the sink asks to stop or `stop` becomes `true` (or its
    /// sender is dropped).
    pub async fn run_until<D: DisplaySink + ?Sized>(
        &self,
        sink: &mut D,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            let snapshot = tokio::select! {
                snapshot = self.collect() => snapshot,
                _ = stopped(&mut stop) => break,
            };

            if let Err(e) = sink.render(&snapshot) {
                warn!("Display sink failed: {:#}", e);
            }

            if !sink.should_continue() {
                info!("Display sink closed, stopping poll loop");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_period) => {}
                _ = stopped(&mut stop) => break,
            }
        }
    }
}

impl<S: MetricSource + 'static> Poller<S> {
    /// Run the poll loop on a background task.
    pub fn spawn<D: DisplaySink + 'static>(self, mut sink: D) -> PollerHandle {
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            self.run_until(&mut sink, stop_rx).await;
        });

        PollerHandle { stop_tx, task }
    }
}

/// Resolves once `stop` is `true` or its sender is gone.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Handle for a background poll loop.
///
/// Dropping the handle stops the loop at its next wait point.
#[derive(Debug)]
pub struct PollerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Ask the loop to stop and wait for it to finish.
    pub async fn stop(self) -> Result<(), JoinError> {
        let _ = self.stop_tx.send(true);
        self.task.await
    }

    /// Wait for the loop to end on its own (the sink stopped it).
    pub async fn join(self) -> Result<(), JoinError> {
        let PollerHandle { stop_tx, task } = self;
        let result = task.await;
        drop(stop_tx);
        result
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
