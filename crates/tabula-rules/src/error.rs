//! Error types for the rules layer.

/// Errors a rules implementation reports to the session engine.
///
/// Move rejections are not errors: they are ordinary `Err(reason)` values
/// from [`GameRules::validate_move`](crate::GameRules::validate_move) and
/// never end a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// `initialize` was asked for a player count outside `[min, max]`.
    #[error("{game} requires {min}-{max} players, got {requested}")]
    InvalidPlayerCount {
        game: String,
        requested: usize,
        min: usize,
        max: usize,
    },

    /// The rules declare bounds that break `1 <= min <= max`.
    #[error("invalid player bounds: min {min}, max {max}")]
    InvalidBounds { min: usize, max: usize },
}
