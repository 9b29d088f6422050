//! Room configuration and the round engine's state machine.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings for one room.
///
/// `join_open` seeds the registry's join gate, `starting_points` is
/// repriced by the `"Point N"` chat command while no game is running.
/// Everything else is fixed for the life of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Fewest seated players that can start (and keep) a game.
    pub min_players: usize,

    /// Most players that can be seated at once.
    pub max_players: usize,

    /// Whether `join` is accepted when the room is created.
    pub join_open: bool,

    /// Points each player starts a game with.
    pub starting_points: f64,

    /// Pause between `startgame` and the first countdown.
    pub start_delay: Duration,

    /// Length of the click window.
    pub countdown: Duration,

    /// Pause between resolving clicks and showing the status.
    pub status_delay: Duration,
}

impl RoomConfig {
    /// The countdown as shown to clients, rounded up to whole seconds.
    pub fn countdown_secs(&self) -> u64 {
        self.countdown.as_millis().div_ceil(1000) as u64
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 10,
            join_open: true,
            starting_points: 3.0,
            start_delay: Duration::from_millis(500),
            countdown: Duration::from_secs(5),
            status_delay: Duration::from_millis(100),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineState
// ---------------------------------------------------------------------------

/// Where a running game is within its round.
///
/// ```text
/// Starting → Countdown → Resolving → Broadcasting → AwaitingSync ─┐
///               ↑                                                 │
///               └──────────────── barrier released ───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// `startgame` sent, first countdown not yet armed.
    Starting,
    /// Click window open.
    Countdown,
    /// Clicks tallied, status not yet shown.
    Resolving,
    /// Per-player status being emitted.
    Broadcasting,
    /// Waiting for every player to acknowledge the round.
    AwaitingSync,
}

/// Lifecycle of the round engine.
///
/// ```text
/// Idle → Running(..) → Ended → Running(..) → ...
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No game has been played yet. No click or point rows exist.
    Idle,
    /// A game is in progress.
    Running(Phase),
    /// The last game ended (elimination, `endGame`, or too few players).
    Ended,
}

impl EngineState {
    /// Returns `true` while a game is in progress.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    /// Returns `true` if a `roundAck` counts toward the sync barrier now.
    ///
    /// Acks during the countdown belong to the previous round and are
    /// dropped.
    pub fn accepts_round_ack(&self) -> bool {
        matches!(
            self,
            Self::Running(Phase::Resolving | Phase::Broadcasting | Phase::AwaitingSync)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Starting"),
            Self::Countdown => write!(f, "Countdown"),
            Self::Resolving => write!(f, "Resolving"),
            Self::Broadcasting => write!(f, "Broadcasting"),
            Self::AwaitingSync => write!(f, "AwaitingSync"),
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running(phase) => write!(f, "Running({phase})"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
