//! Row types held by the [`StateStore`](crate::StateStore).

use quickclick_protocol::ConnectionId;
use serde::{Deserialize, Serialize};

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub connection: ConnectionId,
}

/// Whether a player pressed the button this round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickState {
    pub player: String,
    pub clicked: bool,
}

/// A player's remaining points. Never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointState {
    pub player: String,
    pub points: f64,
}

/// Barrier arrival counter for the current round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSync {
    pub acked: usize,
}
