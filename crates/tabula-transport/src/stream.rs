//! Length-prefixed connections over plain byte streams, and the TCP
//! listener that produces them.

use std::net::SocketAddr;

use tabula_protocol::{read_frame, write_frame};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// A [`Connection`] over any ordered byte stream.
///
/// The stream is split so a blocked `recv` never holds up a `send` on the
/// same connection. Each half sits behind its own async mutex, which keeps
/// frames from interleaving when two tasks write at once.
pub struct StreamConnection<S> {
    id: ConnectionId,
    peer_addr: Option<SocketAddr>,
    reader: Mutex<ReadHalf<S>>,
    writer: Mutex<WriteHalf<S>>,
}

/// A TCP connection to one participant.
pub type TcpConnection = StreamConnection<TcpStream>;

impl<S> StreamConnection<S>
where
    S: AsyncRead + AsyncWrite,
{
    /// Wraps a stream with no known peer address (e.g. a `duplex` pipe).
    pub fn new(stream: S) -> Self {
        Self::with_peer(stream, None)
    }

    fn with_peer(stream: S, peer_addr: Option<SocketAddr>) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            id: ConnectionId::next(),
            peer_addr,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    /// The remote address, when the stream has one.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

impl StreamConnection<TcpStream> {
    /// Opens a client-side TCP connection.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(addr, error = %e, "failed to set TCP_NODELAY");
        }
        let peer = stream.peer_addr().ok();
        Ok(Self::with_peer(stream, peer))
    }
}

impl<S> Connection for StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, data).await.map_err(|e| match e {
            tabula_protocol::ProtocolError::Io(io) => TransportError::SendFailed(io),
            other => TransportError::Framing(other),
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        read_frame(&mut *reader).await.map_err(|e| match e {
            tabula_protocol::ProtocolError::Io(io) => TransportError::ReceiveFailed(io),
            other => TransportError::Framing(other),
        })
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// A TCP [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        // Frames are small and latency-sensitive.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
        }

        let conn = StreamConnection::with_peer(stream, Some(addr));
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
