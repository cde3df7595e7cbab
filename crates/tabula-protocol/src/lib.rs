//! Wire protocol for Tabula.
//!
//! This crate defines the "language" the session server and its clients
//! speak:
//!
//! - **Types** ([`Message`], [`MessageKind`], [`PlayerId`] and the payload
//!   structs): the closed message vocabulary.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a message becomes
//!   payload bytes.
//! - **Framing** ([`write_frame`], [`read_frame`], [`encode_frame`],
//!   [`read_message`]): how payloads are delimited on a byte stream.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Session (turn engine)
//! ```
//!
//! The protocol layer knows nothing about turns or game rules; it only
//! knows how to put messages on the wire and take them off again.

mod codec;
mod error;
mod framing;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use framing::{
    LENGTH_PREFIX_LEN, MAX_FRAME_LEN, decode_message, encode_frame, frame, read_frame,
    read_message, write_frame,
};
pub use types::{
    Connected, GameEnd, GameStart, GameStateUpdate, Message, MessageKind, MoveAccepted,
    MoveRequest, PlayerId, ServerNotice, YourTurn,
};
