//! Error types for the protocol layer.
//!
//! Each crate in Quickclick defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization, not in
//! networking or game rules.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `"type"` tag, or a
    /// `toggleJoin` mode other than `"on"` / `"off"`.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is not acceptable at the protocol level, e.g. a binary
    /// frame that is not valid UTF-8 text.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
