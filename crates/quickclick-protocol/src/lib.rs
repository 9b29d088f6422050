//! Wire protocol for Quickclick.
//!
//! This crate defines the "language" that browser clients and the game
//! server speak:
//!
//! - **Types** ([`ClientCommand`], [`ServerEvent`], [`Recipient`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the room
//! (game rules). It doesn't know about sockets or rounds — it only knows
//! how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand) → Room (RoundEngine)
//! Room (ServerEvent) → Protocol (bytes) → Transport
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientCommand, ConnectionId, JoinToggle, NoticeContext, Recipient,
    ServerEvent, SERVER_SENDER,
};
