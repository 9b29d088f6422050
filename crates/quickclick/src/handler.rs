//! Per-connection handler: the gateway between one socket and the room.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Finish the WebSocket upgrade, bounded by the handshake timeout
//!   2. Register an outbound channel with the room (roster replay arrives on it)
//!   3. Loop: decode inbound frames into commands, encode room events out
//!   4. On exit, close the socket; the guard tells the room the connection is gone

use std::sync::Arc;

use quickclick_protocol::{ClientCommand, Codec, ConnectionId, ServerEvent};
use quickclick_room::RoomHandle;
use quickclick_transport::{
    Connection, Pending, PendingWebSocket, TransportError, WebSocketConnection,
};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::QuickClickError;

/// Drop guard that unseats the connection's player when the handler exits.
///
/// `Drop` is synchronous, so the disconnect runs on a spawned task.
struct ConnectionGuard {
    connection: ConnectionId,
    room: RoomHandle,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let connection = self.connection;
        let room = self.room.clone();
        tokio::spawn(async move {
            if let Err(e) = room.disconnect(connection).await {
                tracing::debug!(%connection, error = %e, "disconnect not delivered");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    pending: PendingWebSocket,
    state: Arc<ServerState<C>>,
) -> Result<(), QuickClickError> {
    let connection = pending.id();

    let conn = match tokio::time::timeout(state.handshake_timeout, pending.upgrade()).await {
        Ok(upgraded) => upgraded?,
        Err(_) => {
            tracing::debug!(%connection, "handshake timed out, dropping peer");
            return Err(TransportError::HandshakeTimedOut.into());
        }
    };
    tracing::debug!(%connection, "handling new connection");

    let (tx, outbound) = mpsc::unbounded_channel();
    state.room.connect(connection, tx).await?;
    let _guard = ConnectionGuard {
        connection,
        room: state.room.clone(),
    };

    let result = pump(&conn, &state, outbound).await;

    if let Err(e) = conn.close().await {
        tracing::debug!(%connection, error = %e, "close after session end failed");
    }

    // _guard drops here → room disconnect fires.
    result
}

/// Moves frames both ways until the peer leaves or the room goes away.
async fn pump<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
) -> Result<(), QuickClickError> {
    let connection = conn.id();

    loop {
        tokio::select! {
            frame = conn.recv() => {
                let data = match frame {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%connection, "connection closed");
                        return Ok(());
                    }
                    Err(e) => {
                        tracing::debug!(%connection, error = %e, "recv error");
                        return Ok(());
                    }
                };

                let command: ClientCommand = match state.codec.decode(&data) {
                    Ok(command) => command,
                    Err(e) => {
                        tracing::debug!(%connection, error = %e, "undecodable frame dropped");
                        continue;
                    }
                };
                state.room.send_command(connection, command).await?;
            }
            event = outbound.recv() => {
                let Some(event) = event else {
                    tracing::debug!(%connection, "room closed the outbound channel");
                    return Ok(());
                };
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
        }
    }
}
