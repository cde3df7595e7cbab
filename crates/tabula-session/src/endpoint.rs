//! A seated player's message channel.

use tabula_protocol::{Codec, JsonCodec, Message, PlayerId};
use tabula_transport::{Connection, ConnectionId, TransportError};

use crate::SessionError;

/// One admitted player: their id plus the connection that reaches them.
///
/// Endpoints speak whole [`Message`]s. Encoding goes through a [`Codec`]
/// (JSON unless told otherwise); decoding never fails, an undecodable
/// payload arrives as a synthetic `ERROR` message.
pub struct Endpoint<C, K = JsonCodec> {
    player_id: PlayerId,
    conn: C,
    codec: K,
}

impl<C> Endpoint<C>
where
    C: Connection<Error = TransportError>,
{
    pub fn new(player_id: PlayerId, conn: C) -> Self {
        Self::with_codec(player_id, conn, JsonCodec)
    }
}

impl<C, K> Endpoint<C, K>
where
    C: Connection<Error = TransportError>,
    K: Codec,
{
    pub fn with_codec(player_id: PlayerId, conn: C, codec: K) -> Self {
        Self {
            player_id,
            conn,
            codec,
        }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Encodes and sends one message.
    pub async fn send(&self, msg: &Message) -> Result<(), SessionError> {
        let payload = self.codec.encode(msg)?;
        self.conn.send(&payload).await?;
        tracing::trace!(player_id = %self.player_id, kind = %msg.kind(), "sent");
        Ok(())
    }

    /// Waits for the next message. `Ok(None)` means the peer is gone.
    pub async fn recv(&self) -> Result<Option<Message>, TransportError> {
        let Some(payload) = self.conn.recv().await? else {
            return Ok(None);
        };
        let msg = tabula_protocol::decode_message(&self.codec, &payload);
        tracing::trace!(player_id = %self.player_id, kind = %msg.kind(), "received");
        Ok(Some(msg))
    }

    /// Closes the underlying connection. Failures are logged, not returned:
    /// the endpoint is being discarded either way.
    pub async fn close(&self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(player_id = %self.player_id, error = %e, "close failed");
        }
    }
}

impl<C, K> std::fmt::Debug for Endpoint<C, K>
where
    C: Connection,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("player_id", &self.player_id)
            .field("connection", &self.conn.id())
            .finish()
    }
}
