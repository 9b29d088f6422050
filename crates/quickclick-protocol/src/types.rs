//! Core protocol types for Quickclick's wire format.
//!
//! Every type here travels "on the wire": clients send [`ClientCommand`]s,
//! the server answers with [`ServerEvent`]s. Both are JSON objects tagged
//! by a `"type"` field so a browser client can switch on `msg.type`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender name used for chat messages that originate from the server.
pub const SERVER_SENDER: &str = "Server";

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque identifier for a client connection.
///
/// Assigned by the transport when a socket is accepted. Players are
/// keyed by it, so it is the only identity the room ever trusts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// The round engine returns `(Recipient, ServerEvent)` pairs; the room
/// actor resolves them against the set of open connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every open connection, joined or not.
    All,

    /// One specific connection (rejection notices, roster replay).
    Connection(ConnectionId),
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Argument of the `toggleJoin` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinToggle {
    On,
    Off,
}

impl JoinToggle {
    /// `true` for [`JoinToggle::On`].
    pub fn is_open(self) -> bool {
        matches!(self, Self::On)
    }
}

/// A command sent by a client.
///
/// Every command arrives tagged with the sender's [`ConnectionId`] by the
/// gateway, so none of them carry identity of their own, except
/// `clickBtn`, whose `name` must match the sender's player.
///
/// JSON shape: `{ "type": "join", "name": "Alice" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Take a seat in the room under `name`.
    Join { name: String },

    /// Open or close the room to new joins.
    ToggleJoin { mode: JoinToggle },

    /// Post a chat line. `"Point <N>"` sets the starting points while no
    /// game is running.
    Chat { message: String },

    /// Start a game with everybody currently seated.
    StartGame,

    /// Press the button for this round.
    ClickBtn { name: String },

    /// Abort the current game.
    EndGame,

    /// "I've finished showing this round's status." Counted by the sync
    /// barrier before the next countdown starts.
    RoundAck,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Which client screen a `noexec` notice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeContext {
    /// The name entry / join form.
    Login,
    /// The start-game button.
    Start,
}

/// An event pushed by the server.
///
/// JSON shape: `{ "type": "showstatus", "name": "Bob", "clicked": true, "points": 2.5 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEvent {
    /// A player took a seat (also replayed to newly connected clients).
    AddPlayer { name: String },

    /// A player left the room.
    RemovePlayer { name: String },

    /// A command was refused. Only the originating connection gets this.
    NoExec {
        message: String,
        context: NoticeContext,
    },

    /// A chat line. `sender` is a player name or [`SERVER_SENDER`].
    ChatMessage { message: String, sender: String },

    /// A game has started; the first countdown follows shortly.
    StartGame,

    /// A click window of `seconds` is open.
    Countdown { seconds: u64 },

    /// `loser` ran out of points. The game is over.
    #[serde(rename = "result")]
    Loser { loser: String },

    /// One player's state after the round resolved.
    ShowStatus {
        name: String,
        clicked: bool,
        points: f64,
    },

    /// Every client acknowledged the round; clear the status display.
    HideStatus,

    /// The game was ended (explicitly or because too few players remain).
    EndGame,
}
