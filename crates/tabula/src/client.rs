//! The player side of the protocol.

use serde_json::Value;
use tabula_protocol::{Codec, JsonCodec, Message};
use tabula_transport::{Connection, TcpConnection, TransportError};

use crate::TabulaError;

/// A connection to a Tabula server, speaking whole [`Message`]s.
///
/// The client is deliberately thin: it does not track whose turn it is.
/// Callers react to `YOUR_TURN` and `MOVE_REJECTED` by sending a move, and
/// stop after `GAME_END` or a disconnect `ERROR`.
///
/// ```rust,no_run
/// use tabula::prelude::*;
///
/// # async fn example() -> Result<(), TabulaError> {
/// let client = GameClient::connect("127.0.0.1:8000").await?;
/// while let Some(msg) = client.recv().await? {
///     match msg {
///         Message::YourTurn(_) | Message::MoveRejected { .. } => client.send_move(5).await?,
///         Message::GameEnd(end) => {
///             println!("{}", end.message);
///             break;
///         }
///         _ => {}
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct GameClient<C = TcpConnection> {
    conn: C,
    codec: JsonCodec,
}

impl GameClient<TcpConnection> {
    /// Connects over TCP with length-prefixed framing.
    pub async fn connect(addr: &str) -> Result<Self, TabulaError> {
        let conn = TcpConnection::connect(addr).await?;
        tracing::debug!(addr, "connected to server");
        Ok(Self::new(conn))
    }
}

impl<C> GameClient<C>
where
    C: Connection<Error = TransportError>,
{
    /// Wraps an established connection.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            codec: JsonCodec,
        }
    }

    pub async fn send(&self, msg: &Message) -> Result<(), TabulaError> {
        let payload = self.codec.encode(msg)?;
        self.conn.send(&payload).await?;
        Ok(())
    }

    /// Submits a move. The value is passed to the game rules untouched.
    pub async fn send_move(&self, value: impl Into<Value>) -> Result<(), TabulaError> {
        self.send(&Message::move_of(value)).await
    }

    /// Waits for the next message; `Ok(None)` once the server has closed
    /// the connection.
    pub async fn recv(&self) -> Result<Option<Message>, TabulaError> {
        let Some(payload) = self.conn.recv().await? else {
            return Ok(None);
        };
        Ok(Some(tabula_protocol::decode_message(&self.codec, &payload)))
    }

    /// Like [`recv`](Self::recv), but a closed connection is an error.
    pub async fn expect_message(&self) -> Result<Message, TabulaError> {
        self.recv().await?.ok_or(TabulaError::Closed)
    }

    /// Tells the server we are leaving, then closes the connection.
    pub async fn disconnect(self) -> Result<(), TabulaError> {
        // The server may already be gone; closing is what matters.
        if let Err(e) = self.send(&Message::Disconnect).await {
            tracing::debug!(error = %e, "disconnect notice not delivered");
        }
        self.conn.close().await?;
        Ok(())
    }
}

/// Returns `true` for an `ERROR` that means the game is over for this
/// client (another player left or the server ended the game).
pub fn is_terminal_error(msg: &Message) -> bool {
    match msg {
        Message::Error { error } => {
            let lower = error.to_lowercase();
            lower.contains("disconnected") || lower.contains("ended")
        }
        _ => false,
    }
}
