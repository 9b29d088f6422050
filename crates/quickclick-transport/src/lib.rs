//! Transport abstraction layer for Quickclick.
//!
//! Provides the [`Transport`] and [`Connection`] traits so the gateway
//! can push events and read commands without knowing which socket
//! technology carries them.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use quickclick_protocol::ConnectionId;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// A peer that has connected but not finished its handshake.
    type Pending: Pending<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by a completed handshake.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer. Returns before any handshake traffic, so
    /// a silent peer cannot hold up the accept loop.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// An accepted peer whose protocol handshake has not run yet.
///
/// `upgrade` is meant to run on the peer's own task, under a timeout.
pub trait Pending: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Completes the handshake.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;

    /// The id the connection will carry once upgraded.
    fn id(&self) -> ConnectionId;
}

/// A single connection that can send and receive frames.
///
/// `send` and `recv` take `&self` and must not block each other: the
/// gateway waits on `recv` while pushing room events through `send`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
