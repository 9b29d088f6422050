//! Error types for the state store.

use quickclick_protocol::ConnectionId;

/// Row uniqueness violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A player with this name already exists.
    #[error("player name {0:?} already exists")]
    DuplicateName(String),

    /// The connection already owns a player.
    #[error("{0} already owns a player")]
    DuplicateConnection(ConnectionId),
}
