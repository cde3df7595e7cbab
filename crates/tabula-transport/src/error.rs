use std::io;

use tabula_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
///
/// Every variant is specific to one connection or listener; none of them
/// says anything about the game being played over it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    /// A client could not reach the server.
    #[error("cannot connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    /// Accepting a connection, or completing its handshake, failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// The peer broke framing (e.g. an implausible length prefix).
    #[error("framing failed: {0}")]
    Framing(#[from] ProtocolError),
}
