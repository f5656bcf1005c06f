use tokio::sync::watch;

use super::snapshot::Snapshot;

/// Latest-wins handoff from the sampler to the consumer.
///
/// Metrics are a live gauge, not an event log: if the consumer has not
/// drained the previous snapshot, the next publication overwrites it.
/// Staleness is the failure mode to avoid, never loss.
pub fn snapshot_channel() -> (SnapshotSender, SnapshotReceiver) {
    let (tx, rx) = watch::channel(None);
    (SnapshotSender { tx }, SnapshotReceiver { rx })
}

pub struct SnapshotSender {
    tx: watch::Sender<Option<Snapshot>>,
}

impl SnapshotSender {
    pub fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(Some(snapshot));
    }
}

pub struct SnapshotReceiver {
    rx: watch::Receiver<Option<Snapshot>>,
}

impl SnapshotReceiver {
    /// Non-blocking: the most recent unseen snapshot, or `None` when
    /// nothing new has been published since the last call.
    pub fn try_receive(&mut self) -> Option<Snapshot> {
        if self.rx.has_changed().unwrap_or(false) {
            self.rx.borrow_and_update().clone()
        } else {
            None
        }
    }
}
