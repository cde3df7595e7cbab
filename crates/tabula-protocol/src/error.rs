//! Error types for the protocol layer.
//!
//! Each crate in Tabula defines its own error enum. A `ProtocolError` always
//! means the problem is in framing or (de)serialization, not in the game
//! rules or the session state machine.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields, or a
    /// `type` tag outside the message vocabulary.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A length prefix declared more bytes than [`MAX_FRAME_LEN`].
    ///
    /// The stream can no longer be trusted to be aligned on a frame
    /// boundary, so this is fatal for the connection that produced it.
    ///
    /// [`MAX_FRAME_LEN`]: crate::MAX_FRAME_LEN
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: u32 },

    /// The underlying byte stream failed.
    #[error("stream i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The message parsed as JSON but violates the vocabulary, e.g. a
    /// `GAME_END` without its `data` object.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
