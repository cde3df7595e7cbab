use std::fmt;

use tabula_protocol::PlayerId;
use tabula_rules::TerminalResult;

/// How a session that ran to completion ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The rules reported a terminal state; `GAME_END` went to everyone.
    Finished(TerminalResult),
    /// A player left or became unreachable; the others were told.
    Disconnected {
        player: PlayerId,
        cause: DisconnectCause,
    },
    /// The server was asked to stop.
    Shutdown,
}

impl SessionOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

/// Why a player was dropped from a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The connection closed or failed while waiting for the player.
    Closed,
    /// The player sent `DISCONNECT`.
    Requested,
    /// The player held the turn past the configured timeout.
    TimedOut,
    /// A message to the player could not be delivered.
    SendFailed,
}

impl fmt::Display for DisconnectCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed"),
            Self::Requested => write!(f, "left the game"),
            Self::TimedOut => write!(f, "turn timed out"),
            Self::SendFailed => write!(f, "unreachable"),
        }
    }
}
