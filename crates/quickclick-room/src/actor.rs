//! Room actor: a Tokio task that owns the round engine and its timer.
//!
//! Connection handlers talk to it through a [`RoomHandle`]. The actor
//! applies each [`Step`] the engine returns: it re-arms or cancels the
//! phase timer, then fans the events out to the connections' channels.

use std::collections::HashMap;

use quickclick_protocol::{ClientCommand, ConnectionId, Recipient, ServerEvent};
use quickclick_store::StateStore;
use quickclick_timer::PhaseTimer;
use tokio::sync::{mpsc, oneshot};

use crate::{EngineState, RoomConfig, RoomError, RoundEngine, Standing, Step, TimerRequest};

/// Channel the actor pushes a connection's outbound events into.
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

pub(crate) enum RoomCommand {
    /// Register a connection's outbound channel and replay the roster.
    Connect {
        connection: ConnectionId,
        sender: ClientSender,
        reply: oneshot::Sender<()>,
    },

    /// Drop a connection, unseating its player if it had one.
    Disconnect {
        connection: ConnectionId,
        reply: oneshot::Sender<()>,
    },

    /// A decoded command from a connection.
    Client {
        connection: ConnectionId,
        command: ClientCommand,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    Shutdown,
}

/// Snapshot of the room for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub state: EngineState,
    pub players: Vec<String>,
    pub join_open: bool,
    pub starting_points: f64,
    pub round: u64,
    pub standings: Vec<Standing>,
    /// Open connections, seated or not.
    pub connections: usize,
}

/// Handle to the running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Registers `connection`. Resolves once the roster replay is queued
    /// on `sender`.
    pub async fn connect(
        &self,
        connection: ConnectionId,
        sender: ClientSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Connect {
                connection,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Disconnect {
                connection,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    /// Forwards a client command (fire-and-forget).
    pub async fn send_command(
        &self,
        connection: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Client {
                connection,
                command,
            })
            .await
            .map_err(|_| RoomError::Unavailable)
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable)?;
        reply_rx.await.map_err(|_| RoomError::Unavailable)
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable)
    }
}

struct RoomActor {
    engine: RoundEngine,
    timer: PhaseTimer,
    clients: HashMap<ConnectionId, ClientSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(config = ?self.engine.config(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                token = self.timer.expired() => {
                    let step = self.engine.on_timer(token);
                    self.apply(step);
                }
            }
        }

        let stats = self.timer.stats();
        tracing::info!(
            timers_armed = stats.armed,
            timers_fired = stats.fired,
            timers_cancelled = stats.cancelled,
            "room actor stopped"
        );
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Connect {
                connection,
                sender,
                reply,
            } => {
                self.clients.insert(connection, sender);
                tracing::debug!(%connection, connections = self.clients.len(), "connection registered");
                let step = self.engine.connect(connection);
                self.apply(step);
                let _ = reply.send(());
            }
            RoomCommand::Disconnect { connection, reply } => {
                self.clients.remove(&connection);
                tracing::debug!(%connection, connections = self.clients.len(), "connection dropped");
                let step = self.engine.leave(connection);
                self.apply(step);
                let _ = reply.send(());
            }
            RoomCommand::Client {
                connection,
                command,
            } => {
                if !self.clients.contains_key(&connection) {
                    tracing::warn!(%connection, "command from unregistered connection, ignoring");
                    return true;
                }
                let step = self.engine.handle(connection, command);
                self.apply(step);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Shutdown => {
                tracing::info!("room shutting down");
                self.timer.cancel();
                return false;
            }
        }
        true
    }

    fn apply(&mut self, step: Step) {
        match step.timer {
            Some(TimerRequest::Arm { after, token }) => self.timer.arm(after, token),
            Some(TimerRequest::Cancel) => {
                self.timer.cancel();
            }
            None => {}
        }
        self.dispatch(step.events);
    }

    fn dispatch(&self, events: Vec<(Recipient, ServerEvent)>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for connection in self.clients.keys() {
                        self.send_to(*connection, event.clone());
                    }
                }
                Recipient::Connection(connection) => self.send_to(connection, event),
            }
        }
    }

    /// Silently drops the event if the connection's receiver is gone.
    fn send_to(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.clients.get(&connection) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            state: self.engine.state(),
            players: self.engine.current_players(),
            join_open: self.engine.is_join_open(),
            starting_points: self.engine.config().starting_points,
            round: self.engine.round(),
            standings: self.engine.standings(),
            connections: self.clients.len(),
        }
    }
}

/// Spawns the room actor over `store` and returns its handle.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_room(config: RoomConfig, store: StateStore, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        engine: RoundEngine::with_store(config, store),
        timer: PhaseTimer::new(),
        clients: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { sender: tx }
}
