//! Unified error type for the Quickclick server.

use quickclick_protocol::ProtocolError;
use quickclick_room::RoomError;
use quickclick_transport::TransportError;

/// Top-level error that wraps every crate-specific error, so `?` works
/// across layer boundaries in the server and the connection handler.
#[derive(Debug, thiserror::Error)]
pub enum QuickClickError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room actor rejected the request or is gone.
    #[error(transparent)]
    Room(#[from] RoomError),
}
