//! WebSocket endpoints via `tokio-tungstenite`.
//!
//! A WebSocket already delimits messages, so each binary message carries
//! exactly one frame payload and no length prefix is added. Text messages
//! are accepted too, for browser clients that send JSON as text.

use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tabula_protocol::{MAX_FRAME_LEN, ProtocolError};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// How long an accepted TCP stream may take to finish the WebSocket
/// handshake.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Listens for WebSocket clients.
pub struct WebSocketTransport {
    listener: TcpListener,
    handshake_timeout: Duration,
}

impl WebSocketTransport {
    /// Binds the listener. Each accepted TCP stream still has to complete
    /// the WebSocket handshake before it is handed out.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self {
            listener,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        })
    }

    /// Sets how long a peer may stall the handshake before `accept` gives
    /// up on it.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let handshake = tokio_tungstenite::accept_async(stream);
        let ws = match tokio::time::timeout(self.handshake_timeout, handshake).await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                tracing::debug!(%addr, error = %e, "WebSocket handshake failed");
                return Err(TransportError::AcceptFailed(ws_io(
                    ErrorKind::ConnectionRefused,
                    e,
                )));
            }
            Err(_) => {
                tracing::debug!(
                    %addr,
                    timeout = ?self.handshake_timeout,
                    "WebSocket handshake timed out"
                );
                return Err(TransportError::AcceptFailed(io::Error::new(
                    ErrorKind::TimedOut,
                    "WebSocket handshake timed out",
                )));
            }
        };

        let conn = WebSocketConnection {
            id: ConnectionId::next(),
            peer_addr: addr,
            ws: Mutex::new(ws),
        };
        tracing::debug!(id = %conn.id, %addr, "accepted WebSocket connection");
        Ok(conn)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// One WebSocket client.
///
/// Reads and writes share a single lock. The session engine never sends
/// to a connection while it is waiting to receive from it, so this costs
/// nothing there.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer_addr: SocketAddr,
    ws: Mutex<WebSocketStream<TcpStream>>,
}

impl WebSocketConnection {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = WsMessage::Binary(data.to_vec().into());
        self.ws
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| TransportError::SendFailed(ws_io(ErrorKind::BrokenPipe, e)))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut ws = self.ws.lock().await;
        loop {
            let payload = match ws.next().await {
                Some(Ok(WsMessage::Binary(data))) => data.to_vec(),
                Some(Ok(WsMessage::Text(text))) => text.as_bytes().to_vec(),
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                // Pings are answered by tungstenite itself.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(ws_io(
                        ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            };
            if payload.len() > MAX_FRAME_LEN as usize {
                return Err(ProtocolError::FrameTooLarge {
                    len: payload.len(),
                    max: MAX_FRAME_LEN,
                }
                .into());
            }
            return Ok(Some(payload));
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws
            .lock()
            .await
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(ws_io(ErrorKind::BrokenPipe, e)))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

fn ws_io(kind: ErrorKind, err: tokio_tungstenite::tungstenite::Error) -> io::Error {
    io::Error::new(kind, err)
}
