//! Session engine for Tabula.
//!
//! A session seats players as their connections arrive, starts the game
//! as soon as the rules' minimum is met, and then runs a strict
//! one-actor-at-a-time turn loop until the game ends, a player leaves, or
//! the server is told to stop.
//!
//! # Key Types
//!
//! - [`GameSession`]: admission plus the turn loop.
//! - [`Endpoint`]: a seated player's message channel.
//! - [`SessionPhase`]: `Admitting → Playing → Ending`.
//! - [`SessionConfig`]: per-session settings (turn timeout).
//! - [`Shutdown`] / [`ShutdownListener`]: the external stop signal.
//! - [`SessionOutcome`]: how a session ended.
//!
//! # Example
//!
//! ```no_run
//! use tabula_rules::TicTacToe;
//! use tabula_session::{GameSession, SessionConfig, Shutdown};
//! use tabula_transport::{TcpTransport, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = TcpTransport::bind("127.0.0.1:8000").await?;
//! let mut session = GameSession::new(TicTacToe, SessionConfig::default())?;
//! while !session.is_ready() {
//!     let conn = transport.accept().await?;
//!     session.admit(conn).await?;
//! }
//! let outcome = session.run(Shutdown::new().listener()).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

mod config;
mod endpoint;
mod engine;
mod error;
mod outcome;
mod shutdown;

pub use config::{DEFAULT_TURN_TIMEOUT, SessionConfig, SessionPhase};
pub use endpoint::Endpoint;
pub use engine::GameSession;
pub use error::SessionError;
pub use outcome::{DisconnectCause, SessionOutcome};
pub use shutdown::{Shutdown, ShutdownListener};
