//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The gateway doesn't care HOW commands and events are serialized — it
//! just needs something that implements the [`Codec`] trait.
//!
//! Browser clients speak JSON, so [`JsonCodec`] is the only codec today.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection handler task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use quickclick_protocol::{ClientCommand, Codec, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let cmd: ClientCommand = codec
///     .decode(br#"{"type":"join","name":"Alice"}"#)
///     .unwrap();
/// assert_eq!(cmd, ClientCommand::Join { name: "Alice".into() });
///
/// let bytes = codec.encode(&cmd).unwrap();
/// let again: ClientCommand = codec.decode(&bytes).unwrap();
/// assert_eq!(cmd, again);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        let text = std::str::from_utf8(data).map_err(|e| {
            ProtocolError::InvalidMessage(format!("frame is not UTF-8 text: {e}"))
        })?;
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientCommand, ServerEvent};

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<ClientCommand, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_non_utf8_frame() {
        let result: Result<ClientCommand, _> = JsonCodec.decode(&[0xff, 0xfe, 0x7b]);
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_command() {
        let result: Result<ClientCommand, _> =
            JsonCodec.decode(br#"{"type":"teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_encode_event_is_utf8_json() {
        let bytes = JsonCodec
            .encode(&ServerEvent::Countdown { seconds: 5 })
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, r#"{"type":"countdown","seconds":5}"#);
    }
}
