//! Write-through hook for row changes.

use quickclick_protocol::ConnectionId;

/// A single row mutation, as seen by a [`Journal`].
#[derive(Debug, Clone, PartialEq)]
pub enum RowChange {
    PlayerInserted { name: String, connection: ConnectionId },
    PlayerRemoved { name: String },
    ClickSet { player: String, clicked: bool },
    PointsSet { player: String, points: f64 },
    ClicksReset,
    GameRowsCleared,
    SyncSet { acked: usize },
}

/// Receives every row change after it has been applied in memory.
///
/// Implementations must not fail the caller: a journal that cannot
/// persist a change logs it and moves on.
pub trait Journal: Send + 'static {
    fn record(&mut self, change: &RowChange);
}

/// Logs each change at debug level under the `quickclick_store` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJournal;

impl Journal for TracingJournal {
    fn record(&mut self, change: &RowChange) {
        tracing::debug!(?change, "row change");
    }
}
