//! The `GameRules` trait, the single plugin point of the server.
//!
//! A game is picked once, when the session is built, and the engine calls
//! these methods at the right moments: `initialize` when the table is
//! full enough, `validate_move` then `apply_move` for each attempt, and
//! `check_terminal` at the top of every turn.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_protocol::PlayerId;

use crate::RulesError;

/// The end-of-game outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalResult {
    /// The winning player, or `None` on a draw.
    pub winner: Option<PlayerId>,
    pub draw: bool,
    /// Human-readable summary, e.g. "Player 0 (X) wins!".
    pub message: String,
}

impl TerminalResult {
    /// A game won by `player`.
    pub fn win(player: PlayerId, message: impl Into<String>) -> Self {
        Self {
            winner: Some(player),
            draw: false,
            message: message.into(),
        }
    }

    /// A game nobody won.
    pub fn draw(message: impl Into<String>) -> Self {
        Self {
            winner: None,
            draw: true,
            message: message.into(),
        }
    }

    /// Whether `player` won. Always `false` on a draw.
    pub fn is_won_by(&self, player: PlayerId) -> bool {
        !self.draw && self.winner == Some(player)
    }
}

/// The capability interface every game implements.
///
/// ## State discipline
///
/// `State` is owned by the caller and only ever borrowed here. Every
/// operation that changes the game returns a *new* state, so the engine
/// can hand out per-player views without one view aliasing another.
///
/// ## Moves
///
/// Moves arrive as opaque JSON values. [`validate_move`](Self::validate_move)
/// turns a raw value into the game's own `Move` type or explains why it
/// can't; [`apply_move`](Self::apply_move) only accepts that parsed move,
/// so an unvalidated move can't be applied.
pub trait GameRules: Send + Sync + 'static {
    /// The full game state. Serialized into every state message.
    type State: Clone + Serialize + Send + Sync + 'static;

    /// A move that passed validation.
    type Move: Send + 'static;

    /// Display name, e.g. "Tic-Tac-Toe".
    fn name(&self) -> &str;

    /// Smallest table the game can start with.
    fn min_players(&self) -> usize;

    /// Largest table the game allows.
    fn max_players(&self) -> usize;

    /// Creates the initial state for `player_count` players.
    ///
    /// # Errors
    /// `RulesError::InvalidPlayerCount` if `player_count` is outside
    /// `[min_players, max_players]`.
    fn initialize(&self, player_count: usize) -> Result<Self::State, RulesError>;

    /// Who must move next.
    fn current_player(&self, state: &Self::State) -> PlayerId;

    /// Checks a move without changing anything.
    ///
    /// Must reject a player who doesn't hold the turn with a "not your
    /// turn" reason, and a malformed move with a reason the player can act
    /// on.
    fn validate_move(
        &self,
        state: &Self::State,
        player: PlayerId,
        raw: &Value,
    ) -> Result<Self::Move, String>;

    /// Applies a validated move and advances the turn.
    fn apply_move(&self, state: &Self::State, player: PlayerId, mv: Self::Move) -> Self::State;

    /// Returns the result once the game is over, `None` while it continues.
    fn check_terminal(&self, state: &Self::State) -> Option<TerminalResult>;

    /// The state as `player` is allowed to see it.
    ///
    /// Default: everything is visible.
    fn view_for(&self, state: &Self::State, _player: PlayerId) -> Self::State {
        state.clone()
    }

    /// Human-readable board.
    fn render(&self, state: &Self::State) -> String;

    /// How to enter a move.
    fn move_help(&self) -> String;

    /// Checks that the declared bounds satisfy `1 <= min <= max`.
    fn check_bounds(&self) -> Result<(), RulesError> {
        let (min, max) = (self.min_players(), self.max_players());
        if min == 0 || min > max {
            return Err(RulesError::InvalidBounds { min, max });
        }
        Ok(())
    }

    /// Checks `player_count` against the declared bounds.
    fn check_player_count(&self, player_count: usize) -> Result<(), RulesError> {
        let (min, max) = (self.min_players(), self.max_players());
        if player_count < min || player_count > max {
            return Err(RulesError::InvalidPlayerCount {
                game: self.name().to_string(),
                requested: player_count,
                min,
                max,
            });
        }
        Ok(())
    }
}
