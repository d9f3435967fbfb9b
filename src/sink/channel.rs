//! Channel-based sink.
//!
//! Publishes snapshots on a tokio watch channel. The receiving side always
//! sees a whole snapshot, and only the latest one: a slow display skips
//! intermediate cycles instead of queueing them.

use tokio::sync::watch;

use super::DisplaySink;
use clusterwatch_types::StatusSnapshot;

/// A sink that publishes snapshots to a [`SnapshotReceiver`].
///
/// # Example
///
/// ```
/// use clusterwatch::sink::{ChannelSink, DisplaySink};
/// use clusterwatch::StatusSnapshot;
///
/// let (mut sink, mut receiver) = ChannelSink::create();
/// sink.render(&StatusSnapshot::new(false, Vec::new())).unwrap();
///
/// let latest = receiver.poll().unwrap();
/// assert!(latest.is_empty());
/// ```
#[derive(Debug)]
pub struct ChannelSink {
    sender: watch::Sender<Option<StatusSnapshot>>,
    closed: bool,
}

impl ChannelSink {
    /// Create a connected sink/receiver pair.
    pub fn create() -> (Self, SnapshotReceiver) {
        let (sender, receiver) = watch::channel(None);
        (
            Self {
                sender,
                closed: false,
            },
            SnapshotReceiver { receiver },
        )
    }
}

impl DisplaySink for ChannelSink {
    fn render(&mut self, snapshot: &StatusSnapshot) -> anyhow::Result<()> {
        if self.sender.send(Some(snapshot.clone())).is_err() {
            // Receiver dropped, the display has gone away
            self.closed = true;
            anyhow::bail!("snapshot receiver dropped");
        }
        Ok(())
    }

    fn should_continue(&self) -> bool {
        !self.closed
    }
}

/// The display side of a [`ChannelSink`].
#[derive(Debug)]
pub struct SnapshotReceiver {
    receiver: watch::Receiver<Option<StatusSnapshot>>,
}

impl SnapshotReceiver {
    /// Return the latest snapshot if one arrived since the last call.
    ///
    /// Never blocks.
    pub fn poll(&mut self) -> Option<StatusSnapshot> {
        if self.receiver.has_changed().unwrap_or(false) {
            self.receiver.borrow_and_update().clone()
        } else {
            None
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the sink has been dropped.
    pub async fn changed(&mut self) -> Option<StatusSnapshot> {
        self.receiver.changed().await.ok()?;
        self.receiver.borrow_and_update().clone()
    }

    /// The most recent snapshot, whether or not it was seen before.
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.receiver.borrow().clone()
    }
}
