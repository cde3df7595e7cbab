use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula_protocol::PlayerId;

use crate::{GameRules, RulesError, TerminalResult};

/// Rounds played when none are configured.
pub const DEFAULT_ROUNDS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
    /// An opponent's choice the viewer may not see yet.
    #[serde(rename = "?")]
    Hidden,
}

impl Choice {
    const PLAYABLE: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
            Self::Hidden => "?",
        }
    }

    fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Paper, Self::Rock) | (Self::Scissors, Self::Paper)
        )
    }

    fn parse(raw: &Value) -> Option<Self> {
        let text = raw.as_str()?.trim().to_ascii_lowercase();
        Self::PLAYABLE.into_iter().find(|c| c.as_str() == text)
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpsState {
    /// 1-based; exceeds `rounds` once the match is over.
    pub round: u32,
    pub rounds: u32,
    /// This round's choices, indexed by player.
    pub choices: [Option<Choice>; 2],
    pub scores: [u32; 2],
    pub current_player: PlayerId,
    /// Both choices of the previous round, once one has been played.
    pub last_round: Option<[Choice; 2]>,
}

/// Rock-paper-scissors for two players over a fixed number of rounds.
///
/// Players submit in turn, player 0 first. A choice stays hidden from the
/// opponent until the opponent has chosen too; once both have chosen the
/// round is scored and the next one begins.
#[derive(Debug, Clone, Copy)]
pub struct RockPaperScissors {
    rounds: u32,
}

impl RockPaperScissors {
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for RockPaperScissors {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl GameRules for RockPaperScissors {
    type State = RpsState;
    type Move = Choice;

    fn name(&self) -> &str {
        "Rock-Paper-Scissors"
    }

    fn min_players(&self) -> usize {
        2
    }

    fn max_players(&self) -> usize {
        2
    }

    fn initialize(&self, player_count: usize) -> Result<RpsState, RulesError> {
        self.check_player_count(player_count)?;
        Ok(RpsState {
            round: 1,
            rounds: self.rounds,
            choices: [None; 2],
            scores: [0; 2],
            current_player: PlayerId(0),
            last_round: None,
        })
    }

    fn current_player(&self, state: &RpsState) -> PlayerId {
        state.current_player
    }

    fn validate_move(&self, state: &RpsState, player: PlayerId, raw: &Value) -> Result<Choice, String> {
        if state.current_player != player {
            return Err("It's not your turn".into());
        }
        let choice =
            Choice::parse(raw).ok_or_else(|| String::from("Move must be one of: rock, paper, scissors"))?;
        if state.choices[player.index()].is_some() {
            return Err("You have already made your choice this round".into());
        }
        Ok(choice)
    }

    fn apply_move(&self, state: &RpsState, player: PlayerId, choice: Choice) -> RpsState {
        let mut next = state.clone();
        next.choices[player.index()] = Some(choice);

        if let [Some(first), Some(second)] = next.choices {
            if first.beats(second) {
                next.scores[0] += 1;
            } else if second.beats(first) {
                next.scores[1] += 1;
            }
            next.last_round = Some([first, second]);
            next.choices = [None; 2];
            next.round += 1;
        }

        next.current_player = PlayerId((player.index() + 1) % 2);
        next
    }

    fn check_terminal(&self, state: &RpsState) -> Option<TerminalResult> {
        if state.round <= state.rounds {
            return None;
        }
        let [p1, p2] = state.scores;
        Some(match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => {
                TerminalResult::win(PlayerId(0), format!("Player 0 wins {p1}-{p2}!"))
            }
            std::cmp::Ordering::Less => {
                TerminalResult::win(PlayerId(1), format!("Player 1 wins {p2}-{p1}!"))
            }
            std::cmp::Ordering::Equal => TerminalResult::draw(format!("It's a tie! {p1}-{p2}")),
        })
    }

    fn view_for(&self, state: &RpsState, player: PlayerId) -> RpsState {
        let mut view = state.clone();
        let me = player.index();
        let opponent = (me + 1) % 2;
        if view.choices.get(me).copied().flatten().is_none() && view.choices[opponent].is_some() {
            view.choices[opponent] = Some(Choice::Hidden);
        }
        view
    }

    fn render(&self, state: &RpsState) -> String {
        let mut lines = vec![
            format!("\nRound {}/{}", state.round.min(state.rounds), state.rounds),
            format!(
                "Score: Player 0: {} | Player 1: {}",
                state.scores[0], state.scores[1]
            ),
        ];
        if let Some([a, b]) = state.last_round {
            lines.push(format!("Last round: Player 0 played {a}, Player 1 played {b}"));
        }
        for (i, choice) in state.choices.iter().enumerate() {
            match choice {
                Some(c) => lines.push(format!("Player {i} chose: {c}")),
                None => lines.push(format!("Player {i}: waiting...")),
            }
        }
        lines.join("\n")
    }

    fn move_help(&self) -> String {
        "Enter one of: rock, paper, or scissors".into()
    }
}
