//! `QuickClickServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room actor.

use std::sync::Arc;
use std::time::Duration;

use quickclick_protocol::{Codec, JsonCodec};
use quickclick_room::{spawn_room, RoomConfig, RoomHandle};
use quickclick_store::{Journal, StateStore, TracingJournal};
use quickclick_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::QuickClickError;

/// Bound on the room actor's command queue.
const ROOM_CHANNEL_SIZE: usize = 256;

/// How long a peer gets to finish the WebSocket upgrade.
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) room: RoomHandle,
    pub(crate) codec: C,
    pub(crate) handshake_timeout: Duration,
}

/// Builder for configuring and starting a Quickclick server.
///
/// ```rust,ignore
/// let server = QuickClickServer::builder()
///     .bind("127.0.0.1:0")
///     .room_config(RoomConfig { starting_points: 5.0, ..RoomConfig::default() })
///     .journal(TracingJournal)
///     .build()
///     .await?;
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    store: StateStore,
    handshake_timeout: Duration,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            room_config: RoomConfig::default(),
            store: StateStore::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the address to bind to. Port `0` picks a free port.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Drops peers that have not completed the WebSocket upgrade in time.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Forwards every row change in the room's store to `journal`.
    pub fn journal(mut self, journal: impl Journal) -> Self {
        self.store = self.store.with_journal(journal);
        self
    }

    /// Logs every row change at debug level when `enabled`.
    pub fn trace_rows(self, enabled: bool) -> Self {
        if enabled {
            self.journal(TracingJournal)
        } else {
            self
        }
    }

    /// Binds the listener and spawns the room actor.
    pub async fn build(self) -> Result<QuickClickServer<JsonCodec>, QuickClickError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let room = spawn_room(self.room_config, self.store, ROOM_CHANNEL_SIZE);

        Ok(QuickClickServer {
            transport,
            state: Arc::new(ServerState {
                room,
                codec: JsonCodec,
                handshake_timeout: self.handshake_timeout,
            }),
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Quickclick server with its room running.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct QuickClickServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl QuickClickServer<JsonCodec> {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<C: Codec> QuickClickServer<C> {
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Handle to the room, e.g. for `info()` or `shutdown()`.
    pub fn room(&self) -> RoomHandle {
        self.state.room.clone()
    }

    /// Accepts connections until the process is terminated, spawning a
    /// handler task for each. The WebSocket upgrade runs on that task.
    pub async fn run(mut self) -> Result<(), QuickClickError> {
        tracing::info!(addr = ?self.local_addr().ok(), "quickclick server running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(pending, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
