//! The single Quickclick room.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns the
//! state store, the round engine and the phase timer.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — seats players, enforces the cap and the join gate
//! - [`RoundEngine`] — the round state machine; pure, returns [`Step`]s
//! - [`SyncBarrier`] — counts round acknowledgements
//! - [`RoomHandle`] — send commands to the running room actor
//! - [`RoomConfig`] — player limits, starting points, phase timings

mod actor;
mod barrier;
mod config;
mod engine;
mod error;
mod registry;

pub use actor::{spawn_room, ClientSender, RoomHandle, RoomInfo};
pub use barrier::SyncBarrier;
pub use config::{EngineState, Phase, RoomConfig};
pub use engine::{RoundEngine, Standing, Step, TimerRequest};
pub use error::RoomError;
pub use registry::RoomRegistry;
