//! Transport abstraction layer for Tabula.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the byte stream a participant is reachable on. A [`Connection`] moves
//! whole frame payloads; how frames are delimited is the implementation's
//! business.
//!
//! - [`StreamConnection`]: any `AsyncRead + AsyncWrite` stream, delimited
//!   with the 4-byte length prefix from `tabula-protocol`. Used for TCP
//!   ([`TcpTransport`]) and for in-memory `tokio::io::duplex` pipes.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`,
//!   one payload per binary message.

#![allow(async_fn_in_trait)]

mod error;
mod stream;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use stream::{StreamConnection, TcpConnection, TcpTransport};
#[cfg(feature = "websocket")]
pub use websocket::{DEFAULT_HANDSHAKE_TIMEOUT, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies a connection in logs before (and after) it holds a seat.
///
/// Distinct from a player's seat number: a latecomer who is turned away
/// gets a `ConnectionId` but never a `PlayerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener that produces [`Connection`]s.
///
/// The server accepts from it for the whole life of a session: first to
/// seat players, then to turn latecomers away.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next connection that is ready to carry frames.
    /// For WebSocket this includes the handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Called once when the server stops hosting.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// An ordered, bidirectional pipe to one participant that moves whole
/// frame payloads.
///
/// Methods take `&self` so one connection can be written to while another
/// task waits on it; implementations serialize access internally.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame payload to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame payload from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is closed, including when it
    /// closes part-way through a frame.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the write side. The peer sees end-of-stream after any
    /// frames already sent.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
