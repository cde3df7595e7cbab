use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_protocol::PlayerId;

use crate::{GameRules, RulesError, TerminalResult};

/// Every line that wins, as board indices.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8], // rows
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8], // columns
    [0, 4, 8],
    [2, 4, 6], // diagonals
];

/// One cell of the board. Empty cells serialize as `"#"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    #[serde(rename = "#")]
    Empty,
    X,
    O,
}

impl Mark {
    /// The mark a player places: player 0 is `X`, player 1 is `O`.
    pub fn of(player: PlayerId) -> Self {
        if player.index() == 0 { Self::X } else { Self::O }
    }

    fn owner(self) -> Option<PlayerId> {
        match self {
            Self::Empty => None,
            Self::X => Some(PlayerId(0)),
            Self::O => Some(PlayerId(1)),
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::Empty => '#',
            Self::X => 'X',
            Self::O => 'O',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeState {
    /// Row-major, index 0 is the top-left cell.
    pub board: [Mark; 9],
    pub current_player: PlayerId,
    pub move_count: u8,
}

/// Classic 3×3 tic-tac-toe for exactly two players.
///
/// Moves are the cell numbers 1-9, as a JSON number or a numeric string:
///
/// ```text
/// 1 | 2 | 3
/// 4 | 5 | 6
/// 7 | 8 | 9
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TicTacToe;

impl TicTacToe {
    fn parse_cell(raw: &Value) -> Option<usize> {
        let n = match raw {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse::<u64>().ok()?,
            _ => return None,
        };
        (1..=9).contains(&n).then(|| n as usize - 1)
    }
}

impl GameRules for TicTacToe {
    type State = TicTacToeState;
    /// Zero-based board index.
    type Move = usize;

    fn name(&self) -> &str {
        "Tic-Tac-Toe"
    }

    fn min_players(&self) -> usize {
        2
    }

    fn max_players(&self) -> usize {
        2
    }

    fn initialize(&self, player_count: usize) -> Result<TicTacToeState, RulesError> {
        self.check_player_count(player_count)?;
        Ok(TicTacToeState {
            board: [Mark::Empty; 9],
            current_player: PlayerId(0),
            move_count: 0,
        })
    }

    fn current_player(&self, state: &TicTacToeState) -> PlayerId {
        state.current_player
    }

    fn validate_move(
        &self,
        state: &TicTacToeState,
        player: PlayerId,
        raw: &Value,
    ) -> Result<usize, String> {
        if state.current_player != player {
            return Err("It's not your turn".into());
        }
        let cell = Self::parse_cell(raw)
            .ok_or_else(|| String::from("Move must be a number between 1 and 9"))?;
        if state.board[cell] != Mark::Empty {
            return Err(format!("Position {} is already taken", cell + 1));
        }
        Ok(cell)
    }

    fn apply_move(&self, state: &TicTacToeState, player: PlayerId, cell: usize) -> TicTacToeState {
        let mut next = state.clone();
        next.board[cell] = Mark::of(player);
        next.move_count += 1;
        next.current_player = PlayerId((player.index() + 1) % 2);
        next
    }

    fn check_terminal(&self, state: &TicTacToeState) -> Option<TerminalResult> {
        for line in LINES {
            let [a, b, c] = line.map(|i| state.board[i]);
            if a == b && b == c {
                if let Some(winner) = a.owner() {
                    return Some(TerminalResult::win(
                        winner,
                        format!("Player {} ({}) wins!", winner.index(), a.symbol()),
                    ));
                }
            }
        }
        if state.board.iter().all(|m| *m != Mark::Empty) {
            return Some(TerminalResult::draw("The game is a draw!"));
        }
        None
    }

    fn render(&self, state: &TicTacToeState) -> String {
        let rule = "-".repeat(13);
        let mut out = format!("\n{rule}");
        for row in 0..3 {
            out.push_str("\n|");
            for col in 0..3 {
                let pos = row * 3 + col;
                let cell = match state.board[pos] {
                    Mark::Empty => char::from(b'1' + pos as u8),
                    mark => mark.symbol(),
                };
                out.push_str(&format!(" {cell} |"));
            }
            out.push('\n');
            out.push_str(&rule);
        }
        out
    }

    fn move_help(&self) -> String {
        "Enter a number from 1-9 to place your mark.\n\
         Board positions:\n\
         1 | 2 | 3\n\
         4 | 5 | 6\n\
         7 | 8 | 9"
            .into()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn board_with(x: &[usize], o: &[usize]) -> TicTacToeState {
        let mut state = TicTacToe.initialize(2).unwrap();
        for &i in x {
            state.board[i] = Mark::X;
        }
        for &i in o {
            state.board[i] = Mark::O;
        }
        state
    }

    #[test]
    fn test_initialize_rejects_wrong_player_count() {
        for n in [0, 1, 3] {
            let err = TicTacToe.initialize(n).unwrap_err();
            assert!(matches!(err, RulesError::InvalidPlayerCount { requested, .. } if requested == n));
        }
    }

    #[test]
    fn test_completed_line_wins() {
        let state = board_with(&[0, 1, 2], &[3, 4]);
        let result = TicTacToe.check_terminal(&state).unwrap();
        assert_eq!(result.winner, Some(PlayerId(0)));
        assert!(!result.draw);
        assert_eq!(result.message, "Player 0 (X) wins!");
    }

    #[test]
    fn test_win_message_names_the_seat_id() {
        let state = board_with(&[0, 1, 8], &[3, 4, 5]);
        let result = TicTacToe.check_terminal(&state).unwrap();
        assert_eq!(result.winner, Some(PlayerId(1)));
        assert_eq!(result.message, "Player 1 (O) wins!");
    }

    #[test]
    fn test_full_board_without_line_is_draw() {
        // X O X
        // X O X
        // O X O
        let state = board_with(&[0, 2, 3, 5, 7], &[1, 4, 6, 8]);
        let result = TicTacToe.check_terminal(&state).unwrap();
        assert_eq!(result.winner, None);
        assert!(result.draw);
    }

    #[test]
    fn test_open_board_is_not_terminal() {
        let state = board_with(&[0, 4], &[1]);
        assert!(TicTacToe.check_terminal(&state).is_none());
    }

    #[test]
    fn test_every_line_is_detected_for_the_owner_of_the_mark() {
        for line in LINES {
            let state = board_with(&[], &line);
            let result = TicTacToe.check_terminal(&state).unwrap();
            assert_eq!(result.winner, Some(PlayerId(1)), "line {line:?}");
        }
    }

    #[test]
    fn test_line_completed_on_last_cell_is_a_win_not_a_draw() {
        // X X X
        // O O X
        // X O O
        let state = board_with(&[0, 1, 2, 5, 6], &[3, 4, 7, 8]);
        let result = TicTacToe.check_terminal(&state).unwrap();
        assert_eq!(result.winner, Some(PlayerId(0)));
    }

    #[test]
    fn test_validate_rejects_wrong_turn() {
        let state = TicTacToe.initialize(2).unwrap();
        let err = TicTacToe.validate_move(&state, PlayerId(1), &json!(5)).unwrap_err();
        assert!(err.contains("not your turn"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_and_garbage() {
        let state = TicTacToe.initialize(2).unwrap();
        for raw in [json!(0), json!(10), json!(-1), json!("abc"), json!([5]), json!(2.5)] {
            let err = TicTacToe.validate_move(&state, PlayerId(0), &raw).unwrap_err();
            assert!(err.contains("between 1 and 9"), "{raw}: {err}");
        }
    }

    #[test]
    fn test_validate_rejects_taken_cell() {
        let state = board_with(&[4], &[]);
        let state = TicTacToeState {
            current_player: PlayerId(1),
            ..state
        };
        let err = TicTacToe.validate_move(&state, PlayerId(1), &json!("5")).unwrap_err();
        assert_eq!(err, "Position 5 is already taken");
    }

    #[test]
    fn test_validate_accepts_numeric_string() {
        let state = TicTacToe.initialize(2).unwrap();
        assert_eq!(TicTacToe.validate_move(&state, PlayerId(0), &json!(" 9 ")), Ok(8));
    }

    #[test]
    fn test_apply_returns_new_state_and_advances_turn() {
        let before = TicTacToe.initialize(2).unwrap();
        let after = TicTacToe.apply_move(&before, PlayerId(0), 4);

        assert_eq!(before.board[4], Mark::Empty, "input state must not change");
        assert_eq!(after.board[4], Mark::X);
        assert_eq!(after.move_count, 1);
        assert_eq!(TicTacToe.current_player(&after), PlayerId(1));

        let again = TicTacToe.apply_move(&after, PlayerId(1), 0);
        assert_eq!(again.board[0], Mark::O);
        assert_eq!(TicTacToe.current_player(&again), PlayerId(0));
    }

    #[test]
    fn test_view_is_identity() {
        let state = board_with(&[0], &[8]);
        assert_eq!(TicTacToe.view_for(&state, PlayerId(1)), state);
    }

    #[test]
    fn test_render_numbers_empty_cells() {
        let state = board_with(&[0], &[8]);
        let board = TicTacToe.render(&state);
        assert!(board.contains("| X | 2 | 3 |"), "{board}");
        assert!(board.contains("| 7 | 8 | O |"), "{board}");
    }

    #[test]
    fn test_empty_cell_serializes_as_hash() {
        let json = serde_json::to_value(TicTacToe.initialize(2).unwrap()).unwrap();
        assert_eq!(json["board"][0], "#");
        assert_eq!(json["current_player"], 0);
    }
}
