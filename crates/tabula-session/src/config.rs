//! Session configuration and phase machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Default time the acting player has to send something.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(300);

/// Settings for one session.
///
/// Player bounds are not configured here; they come from the game rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How long the acting player may stay silent before the session
    /// treats them as disconnected. `None` waits indefinitely (shutdown
    /// still interrupts the wait).
    pub turn_timeout: Option<Duration>,
}

impl SessionConfig {
    /// A config with no idle limit.
    pub fn without_timeout() -> Self {
        Self { turn_timeout: None }
    }

    /// Sets the idle limit for the acting player.
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Some(DEFAULT_TURN_TIMEOUT),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// Transitions are strictly ordered:
///
/// ```text
/// Admitting → Playing → Ending
/// ```
///
/// - **Admitting**: accepting players, none of them can move yet.
/// - **Playing**: the minimum was reached. Admission is closed and the
///   turn loop owns the game state.
/// - **Ending**: the game finished, a player left, or the server is
///   stopping. Every endpoint is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    Admitting,
    Playing,
    Ending,
}

impl SessionPhase {
    /// Returns `true` if new players may still be admitted.
    pub fn is_admitting(&self) -> bool {
        matches!(self, Self::Admitting)
    }

    /// Returns `true` while the game is running.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns the phase that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Admitting => Some(Self::Playing),
            Self::Playing => Some(Self::Ending),
            Self::Ending => None,
        }
    }

    /// Returns `true` if moving to `target` is a valid transition.
    ///
    /// A session may also end straight from admission (the server stopped
    /// before enough players arrived).
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target) || (self == Self::Admitting && target == Self::Ending)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admitting => write!(f, "Admitting"),
            Self::Playing => write!(f, "Playing"),
            Self::Ending => write!(f, "Ending"),
        }
    }
}
