//! Error types for the session layer.

use tabula_protocol::{PlayerId, ProtocolError};
use tabula_rules::RulesError;
use tabula_transport::TransportError;

/// Errors that stop a session or refuse an operation on it.
///
/// A player leaving is not an error: it ends the session normally with
/// [`SessionOutcome::Disconnected`](crate::SessionOutcome::Disconnected).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The rules refused to start a game or declare broken bounds.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// A connection failed outside the turn loop.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The session is no longer admitting players.
    #[error("session is not admitting players")]
    AdmissionClosed,

    /// `run` was called before the minimum number of players was admitted.
    #[error("session not ready: {admitted} admitted, {min} required")]
    NotReady { admitted: usize, min: usize },

    /// The rules handed the turn to a player who has no seat.
    #[error("rules gave the turn to {0}, who is not seated")]
    UnknownPlayer(PlayerId),
}
