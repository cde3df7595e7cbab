//! Length-prefixed framing over an ordered byte stream.
//!
//! Each frame is a 4-byte big-endian length `N` followed by exactly `N`
//! payload bytes. The payload is one UTF-8 JSON [`Message`]:
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────┐
//! │ len: u32 BE  │ {"type": "MOVE", "data": {"move": 5}} │
//! └──────────────┴──────────────────────────────────────┘
//! ```
//!
//! The length prefix is always trusted and consumed, so a payload that
//! fails to parse costs one message, not the connection. A prefix larger
//! than [`MAX_FRAME_LEN`] is the exception: past that point the stream
//! can't be assumed to be aligned, and the read fails.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Codec, JsonCodec, Message, ProtocolError};

/// Maximum payload size of one frame (16 MiB).
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Prepends the length prefix to an already-serialized payload.
pub fn frame(payload: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = checked_len(payload.len())?;
    let mut out = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Writes one frame and flushes the writer.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = checked_len(payload.len())?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one frame's payload.
///
/// Returns `Ok(None)` when the stream ends, whether cleanly between frames
/// or part-way through a prefix or payload. Suspends until the whole frame
/// is available.
///
/// # Errors
/// `ProtocolError::FrameTooLarge` if the prefix exceeds [`MAX_FRAME_LEN`];
/// `ProtocolError::Io` for any other stream failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LENGTH_PREFIX_LEN];
    if !read_exact_or_eof(reader, &mut len_buf).await? {
        return Ok(None);
    }

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            len: len as usize,
            max: MAX_FRAME_LEN,
        });
    }

    let mut payload = vec![0u8; len as usize];
    if !read_exact_or_eof(reader, &mut payload).await? {
        return Ok(None);
    }
    Ok(Some(payload))
}

/// Encodes a message as a complete frame: prefix plus JSON payload.
pub fn encode_frame(msg: &Message) -> Result<Vec<u8>, ProtocolError> {
    frame(&JsonCodec.encode(msg)?)
}

/// Decodes one frame payload into a [`Message`], never failing.
///
/// A payload that isn't a valid message becomes a synthetic `ERROR`
/// carrying the parse failure, so callers can keep reading the stream.
pub fn decode_message<C: Codec>(codec: &C, payload: &[u8]) -> Message {
    match codec.decode(payload) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(error = %e, len = payload.len(), "undecodable frame payload");
            Message::error(format!("Invalid message format: {e}"))
        }
    }
}

/// Reads and decodes the next message from a stream.
///
/// `Ok(None)` is end-of-stream; see [`read_frame`] and [`decode_message`].
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Message>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    Ok(read_frame(reader)
        .await?
        .map(|payload| decode_message(&JsonCodec, &payload)))
}

fn checked_len(len: usize) -> Result<u32, ProtocolError> {
    match u32::try_from(len) {
        Ok(n) if n <= MAX_FRAME_LEN => Ok(n),
        _ => Err(ProtocolError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        }),
    }
}

/// `read_exact` that reports a short read as `false` instead of an error.
async fn read_exact_or_eof<R>(reader: &mut R, buf: &mut [u8]) -> Result<bool, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(ProtocolError::Io(e)),
    }
}
