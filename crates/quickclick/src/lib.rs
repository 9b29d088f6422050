//! # Quickclick
//!
//! Server for a real-time party game: every round players may click a
//! shared button, and the only clicker of a round pays for it. Whoever
//! runs out of points first loses.
//!
//! The meta crate wires the layers together: the WebSocket transport
//! carries JSON frames, the protocol crate decodes them into
//! [`ClientCommand`]s, and a single room actor runs the game.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quickclick::prelude::*;
//!
//! # async fn run() -> Result<(), QuickClickError> {
//! let server = QuickClickServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .room_config(RoomConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
pub mod logging;
mod server;

pub use error::QuickClickError;
pub use server::{QuickClickServer, ServerBuilder};

pub mod prelude {
    pub use crate::{QuickClickError, QuickClickServer, ServerBuilder};
    pub use quickclick_protocol::{ClientCommand, ConnectionId, NoticeContext, ServerEvent};
    pub use quickclick_room::{EngineState, Phase, RoomConfig, RoomHandle, RoomInfo};
    pub use quickclick_store::{Journal, RowChange, TracingJournal};
}
