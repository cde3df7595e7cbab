//! Game rules for Tabula.
//!
//! The session engine drives any game through the [`GameRules`] trait and
//! never looks inside its state. Two games ship with the crate:
//!
//! - [`TicTacToe`]: two players, full information.
//! - [`RockPaperScissors`]: two players, the opponent's pending choice is
//!   hidden from each player's view.

mod error;
mod games;
mod rules;

pub use error::RulesError;
pub use games::rock_paper_scissors::{Choice, DEFAULT_ROUNDS, RockPaperScissors, RpsState};
pub use games::tic_tac_toe::{Mark, TicTacToe, TicTacToeState};
pub use rules::{GameRules, TerminalResult};
