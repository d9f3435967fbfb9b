//! Log sink - a headless rendering of the status window.

use chrono::{DateTime, Local};
use tracing::info;

use super::DisplaySink;
use clusterwatch_types::{Status, StatusSnapshot};

/// Renders each snapshot as a block of `info` log lines.
#[derive(Debug, Default)]
pub struct LogSink {
    /// Include the failure reason of unavailable readings.
    pub show_errors: bool,
}

impl LogSink {
    pub fn new(show_errors: bool) -> Self {
        Self { show_errors }
    }
}

impl DisplaySink for LogSink {
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        for line in render_lines(snapshot, self.show_errors) {
            info!("{}", line);
        }
        Ok(())
    }
}

/// Text lines for a snapshot: a header with the time and overall severity,
/// then one line per reading in order.
pub fn render_lines(snapshot: &StatusSnapshot, show_errors: bool) -> Vec<String> {
    let mut lines = Vec::with_capacity(snapshot.len() + 1);

    let color = snapshot.severity.color();
    lines.push(format!(
        "[{}] {} ({}{})",
        format_timestamp(snapshot.timestamp_ms),
        snapshot.severity.label(),
        color.hex(),
        if snapshot.night { ", night" } else { "" },
    ));

    for reading in &snapshot.readings {
        let mut line = format!("  {} {}", reading.status.icon(), reading.summary());
        if let Status::Band(band) = reading.status {
            line.push_str(&format!(" [{}]", band.color(snapshot.night).hex()));
        }
        if show_errors {
            if let Some(err) = reading.error() {
                line.push_str(&format!(" - {}", err));
            }
        }
        lines.push(line);
    }

    lines
}

/// `dd.mm.yyyy HH:MM:SS` in local time.
fn format_timestamp(timestamp_ms: u64) -> String {
    DateTime::from_timestamp_millis(timestamp_ms as i64)
        .map(|t| t.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
