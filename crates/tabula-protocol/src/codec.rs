//! Codec trait and the JSON implementation.
//!
//! A "codec" converts between Rust types and the raw payload bytes that
//! sit inside a frame. The framing layer doesn't care HOW a payload is
//! serialized; it only needs something implementing [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` lets a codec live inside long-running Tokio
/// tasks and be shared between them.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is the wire format of the protocol: every frame payload is one
/// UTF-8 JSON object of the shape `{"type": .., "data": .., "error": ..}`.
///
/// ## Example
///
/// ```rust
/// use tabula_protocol::{Codec, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let msg = Message::error("something broke");
///
/// let bytes = codec.encode(&msg).unwrap();
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, decoded);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        // `from_slice` rejects invalid UTF-8 as well as malformed JSON.
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_codec_encodes_utf8_json() {
        let bytes = JsonCodec.encode(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_json_codec_decode_rejects_invalid_utf8() {
        let result: Result<serde_json::Value, _> = JsonCodec.decode(&[0xff, 0xfe, 0x7b]);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
