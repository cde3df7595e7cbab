//! # Tabula
//!
//! A server for turn-based board games played over the network.
//!
//! Players connect, are seated in arrival order, and the game starts as
//! soon as the rules' minimum is met. From then on the server asks one
//! player at a time for a move, validates it against the rules, and keeps
//! everyone's view of the board up to date until the game ends.
//!
//! Games implement a single [`GameRules`](tabula_rules::GameRules) trait;
//! Tabula handles framing, admission, turn order, and teardown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabula::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TabulaError> {
//!     tabula::init_logging("info");
//!     let server = TabulaServer::builder()
//!         .bind("127.0.0.1:8000")
//!         .build(TicTacToe)
//!         .await?;
//!     server.run().await
//! }
//! ```
//!
//! ## Crates
//!
//! - `tabula-protocol`: messages and length-prefixed framing
//! - `tabula-transport`: TCP and WebSocket connections
//! - `tabula-rules`: the rules trait and the bundled games
//! - `tabula-session`: admission and the turn loop

mod client;
mod error;
mod logging;
mod server;

pub use client::{GameClient, is_terminal_error};
pub use error::TabulaError;
pub use logging::init_logging;
pub use server::{BUSY_NOTICE, DEFAULT_BIND_ADDR, ServerConfig, TabulaServer, TabulaServerBuilder};

pub use tabula_protocol as protocol;
pub use tabula_rules as rules;
pub use tabula_session as session;
pub use tabula_transport as transport;

/// Everything needed to host or join a game.
pub mod prelude {
    pub use crate::{GameClient, ServerConfig, TabulaError, TabulaServer};
    pub use tabula_protocol::{Message, MessageKind, PlayerId};
    pub use tabula_rules::{GameRules, RockPaperScissors, RulesError, TerminalResult, TicTacToe};
    pub use tabula_session::{SessionConfig, SessionOutcome, Shutdown};
}
