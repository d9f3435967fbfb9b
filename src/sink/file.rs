//! File sink.
//!
//! Writes the latest snapshot to a JSON file, replacing the previous one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::DisplaySink;
use clusterwatch_types::StatusSnapshot;

/// A sink that overwrites a JSON file with every snapshot.
///
/// The file is written to a sibling temporary path and renamed into place, so
/// readers never observe a half-written snapshot.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    pretty: bool,
}

impl FileSink {
    /// Create a file sink writing pretty-printed JSON to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            pretty: true,
        }
    }

    /// Write compact single-line JSON instead.
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    /// Returns the path being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl DisplaySink for FileSink {
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(snapshot)?
        } else {
            serde_json::to_string(snapshot)?
        };

        let tmp = self.temp_path();
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}
