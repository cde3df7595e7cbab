//! `TabulaServer` builder and server loop.
//!
//! This is the entry point for hosting games. It ties the layers together:
//! transport (accept) → session (admission and turn loop) → rules.
//!
//! One session is active at a time. While it plays, the server keeps
//! accepting so that latecomers get a clear answer instead of hanging in
//! the listen backlog.

use serde::{Deserialize, Serialize};
use tabula_protocol::{Codec, JsonCodec, Message};
use tabula_rules::GameRules;
use tabula_session::{GameSession, SessionConfig, SessionOutcome, Shutdown};
use tabula_transport::{Connection, TcpTransport, Transport, TransportError, WebSocketTransport};

use crate::TabulaError;

/// Where the server listens unless told otherwise.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Sent to anyone who connects while a game is being played.
pub const BUSY_NOTICE: &str = "A game is already in progress. Please try again later.";

/// Server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `"0.0.0.0:8000"`.
    pub bind_addr: String,

    /// Settings applied to every hosted session.
    pub session: SessionConfig,

    /// Host sessions back to back until shutdown instead of returning
    /// after the first one.
    pub serve_forever: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session: SessionConfig::default(),
            serve_forever: false,
        }
    }
}

/// Builder for configuring and starting a Tabula server.
///
/// # Example
///
/// ```rust,no_run
/// use tabula::prelude::*;
///
/// # async fn example() -> Result<(), TabulaError> {
/// let server = TabulaServer::builder()
///     .bind("0.0.0.0:8000")
///     .serve_forever(true)
///     .build(TicTacToe)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Default)]
pub struct TabulaServerBuilder {
    config: ServerConfig,
}

impl TabulaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to each session.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Keeps hosting new sessions after one ends.
    pub fn serve_forever(mut self, enabled: bool) -> Self {
        self.config.serve_forever = enabled;
        self
    }

    /// Binds a TCP listener speaking length-prefixed frames.
    pub async fn build<G>(self, rules: G) -> Result<TabulaServer<G, TcpTransport>, TabulaError>
    where
        G: GameRules + Clone,
    {
        rules.check_bounds()?;
        let transport = TcpTransport::bind(&self.config.bind_addr).await?;
        Ok(TabulaServer::with_transport(transport, rules, self.config))
    }

    /// Binds a WebSocket listener, one message per WebSocket frame.
    pub async fn build_websocket<G>(
        self,
        rules: G,
    ) -> Result<TabulaServer<G, WebSocketTransport>, TabulaError>
    where
        G: GameRules + Clone,
    {
        rules.check_bounds()?;
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        Ok(TabulaServer::with_transport(transport, rules, self.config))
    }
}

/// A bound Tabula server.
///
/// Call [`run()`](Self::run) to start hosting, and use the handle from
/// [`shutdown_handle()`](Self::shutdown_handle) to stop it from elsewhere.
pub struct TabulaServer<G, T> {
    transport: T,
    rules: G,
    config: ServerConfig,
    shutdown: Shutdown,
}

impl TabulaServer<(), TcpTransport> {
    /// Creates a new builder.
    pub fn builder() -> TabulaServerBuilder {
        TabulaServerBuilder::new()
    }
}

impl<G, T> TabulaServer<G, T>
where
    G: GameRules + Clone,
    T: Transport<Error = TransportError>,
    T::Connection: Connection<Error = TransportError>,
{
    /// Wraps an already-bound transport.
    pub fn with_transport(transport: T, rules: G, config: ServerConfig) -> Self {
        Self {
            transport,
            rules,
            config,
            shutdown: Shutdown::new(),
        }
    }

    /// A handle that stops the server. A running game ends without a
    /// result and [`run()`](Self::run) returns.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Hosts one session, or back-to-back sessions until shutdown when
    /// `serve_forever` is set.
    pub async fn run(mut self) -> Result<(), TabulaError> {
        tracing::info!(
            game = %self.rules.name(),
            addr = %self.config.bind_addr,
            serve_forever = self.config.serve_forever,
            "Tabula server running"
        );

        loop {
            let outcome = self.run_session().await?;
            tracing::info!(?outcome, "session ended");
            if !self.config.serve_forever || self.shutdown.is_triggered() {
                break;
            }
        }

        if let Err(e) = self.transport.shutdown().await {
            tracing::debug!(error = %e, "transport shutdown failed");
        }
        tracing::info!("server stopped");
        Ok(())
    }

    /// Hosts exactly one session: admits players until the rules' minimum
    /// is met, then plays while turning latecomers away.
    pub async fn run_session(&mut self) -> Result<SessionOutcome, TabulaError> {
        let mut shutdown = self.shutdown.listener();
        let mut session = GameSession::new(self.rules.clone(), self.config.session.clone())?;

        tracing::info!(
            min = self.rules.min_players(),
            max = self.rules.max_players(),
            "waiting for players"
        );
        while !session.is_ready() {
            let accepted = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    session.close().await;
                    return Ok(SessionOutcome::Shutdown);
                }
                accepted = self.transport.accept() => accepted,
            };
            match accepted {
                Ok(conn) => {
                    if let Err(e) = session.admit(conn).await {
                        tracing::warn!(error = %e, "admission failed");
                    }
                }
                Err(e) => tracing::error!(error = %e, "accept failed"),
            }
        }

        let game = session.run(shutdown);
        tokio::pin!(game);
        loop {
            tokio::select! {
                biased;
                outcome = &mut game => return Ok(outcome?),
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => turn_away(conn).await,
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
            }
        }
    }
}

impl<G, T> TabulaServer<G, T>
where
    T: Transport,
{
    /// The transport, e.g. to read its local address.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<G> TabulaServer<G, TcpTransport> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }
}

impl<G> TabulaServer<G, WebSocketTransport> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }
}

/// Tells a connection that arrived mid-game to come back later.
async fn turn_away<C>(conn: C)
where
    C: Connection<Error = TransportError>,
{
    tracing::info!(conn = %conn.id(), "game in progress, turning connection away");
    let result = async {
        let payload = JsonCodec.encode(&Message::notice(BUSY_NOTICE))?;
        conn.send(&payload).await?;
        Ok::<_, TabulaError>(())
    }
    .await;
    if let Err(e) = result {
        tracing::debug!(conn = %conn.id(), error = %e, "busy notice not delivered");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(conn = %conn.id(), error = %e, "close failed");
    }
}
