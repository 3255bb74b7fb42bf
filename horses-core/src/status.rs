//! What the local player should be told about a board.

use smart_horses_types::{BoardState, Side, Winner};
use std::fmt;

/// Turn or outcome, from the local player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The local side may move.
    YourTurn,
    /// The remote side is to move.
    OpponentThinking,
    /// Game over, local side ahead.
    Won,
    /// Game over, remote side ahead.
    Lost,
    /// Game over, level scores.
    Draw,
}

impl TurnStatus {
    /// Derive the status of `board` for `local`.
    pub fn of(board: &BoardState, local: Side) -> Self {
        match board.outcome() {
            Some(Winner::Draw) => TurnStatus::Draw,
            Some(winner) if winner == Winner::from(local) => TurnStatus::Won,
            Some(_) => TurnStatus::Lost,
            None if board.current_player == local => TurnStatus::YourTurn,
            None => TurnStatus::OpponentThinking,
        }
    }

    /// Whether the game has ended.
    pub fn is_final(self) -> bool {
        matches!(self, TurnStatus::Won | TurnStatus::Lost | TurnStatus::Draw)
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TurnStatus::YourTurn => "Your turn",
            TurnStatus::OpponentThinking => "Machine thinking...",
            TurnStatus::Won => "You Win!",
            TurnStatus::Lost => "Machine Wins",
            TurnStatus::Draw => "Draw",
        })
    }
}
