//! Display sinks - where finished snapshots go.
//!
//! The poll loop pushes each [`StatusSnapshot`] into a [`DisplaySink`]. Sinks
//! are passive: they never read configuration or the clock, everything they
//! need to render (including whether it is night) is in the snapshot.
//!
//! - [`ChannelSink`]: hands snapshots to another task or thread (e.g. a GUI)
//! - [`LogSink`]: renders snapshots as log lines
//! - [`FileSink`]: overwrites a JSON file with the latest snapshot
//! - [`MultiSink`]: fans out to several sinks

mod channel;
mod file;
mod log;

pub use channel::{ChannelSink, SnapshotReceiver};
pub use file::FileSink;
pub use log::{render_lines, LogSink};

use clusterwatch_types::StatusSnapshot;

/// Receiver of status snapshots.
///
/// # Example
///
/// ```
/// use clusterwatch::sink::DisplaySink;
/// use clusterwatch::StatusSnapshot;
///
/// #[derive(Default)]
/// struct CountingSink(usize);
///
/// impl DisplaySink for CountingSink {
///     fn render(&mut self, _snapshot: &StatusSnapshot) -> anyhow::Result<()> {
///         self.0 += 1;
///         Ok(())
///     }
///
///     fn should_continue(&self) -> bool {
///         self.0 < 3
///     }
/// }
/// ```
pub trait DisplaySink: Send {
    /// Render one snapshot. Errors are logged by the poll loop and do not
    /// stop polling.
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()>;

    /// Whether the poll loop should keep going. Checked after every render.
    fn should_continue(&self) -> bool {
        true
    }
}

impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        (**self).render(snapshot)
    }

    fn should_continue(&self) -> bool {
        (**self).should_continue()
    }
}

/// Delivers every snapshot to all inner sinks.
///
/// Stops once any inner sink asks to stop.
#[derive(Default)]
pub struct MultiSink {
    sinks: Vec<Box<dyn DisplaySink>>,
}

impl MultiSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sink: impl DisplaySink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn with(mut self, sink: impl DisplaySink + 'static) -> Self {
        self.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl DisplaySink for MultiSink {
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.render(snapshot) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn should_continue(&self) -> bool {
        self.sinks.iter().all(|s| s.should_continue())
    }
}
