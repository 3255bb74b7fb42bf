//! Request and response bodies of the remote game API.
//!
//! All bodies are JSON. Replies are decoded into the domain types
//! [`MoveOutcome`], [`LegalMoves`] and [`MachineMove`], which is where shape
//! checks that serde cannot express happen.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{BoardState, Coord, Side, TypesError};

/// Strength of the remote opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Shallow search.
    #[default]
    Beginner,
    /// Medium search.
    Amateur,
    /// Deep search.
    Expert,
}

impl Difficulty {
    /// All levels, weakest first.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Amateur,
        Difficulty::Expert,
    ];

    /// Wire name of the level.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Amateur => "amateur",
            Difficulty::Expert => "expert",
        }
    }

    /// Search depth the authority advertises for this level.
    pub fn search_depth(self) -> u8 {
        match self {
            Difficulty::Beginner => 2,
            Difficulty::Amateur => 4,
            Difficulty::Expert => 6,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown difficulty {s:?} (expected beginner, amateur or expert)")
            })
    }
}

/// Body of `POST /api/game/new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGameRequest {
    /// Requested opponent strength
    pub difficulty: Difficulty,
}

/// Body of `POST /api/game/move`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// State the move was chosen on
    pub game_state: BoardState,
    /// Destination of the local knight
    #[serde(rename = "move")]
    pub destination: Coord,
}

/// Reply to `POST /api/game/move`: the new state plus the opponent's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveReply {
    /// New authoritative state
    #[serde(flatten)]
    pub game_state: BoardState,
    /// Destination of the opponent's reply move, if it made one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_move: Option<Coord>,
}

/// Body of `POST /api/game/valid-moves`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalMovesRequest {
    /// Current state
    pub game_state: BoardState,
    /// Knight whose moves are wanted
    pub knight: Side,
}

/// Reply to `POST /api/game/valid-moves`.
///
/// Either a detailed object or, from older authorities, a bare list of
/// destinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegalMovesReply {
    /// Object form, possibly announcing a forced pass
    Detailed {
        /// Set when the side had no legal move and was penalised
        #[serde(default)]
        penalty_applied: bool,
        /// New state after the penalty
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_state: Option<BoardState>,
        /// Opponent move played after the penalty
        #[serde(default, skip_serializing_if = "Option::is_none")]
        machine_move: Option<Coord>,
        /// Legal destinations
        #[serde(default)]
        valid_moves: Vec<Coord>,
    },
    /// Bare list of destinations
    Bare(Vec<Coord>),
}

impl LegalMovesReply {
    /// Decode into the domain form.
    pub fn into_legal_moves(self) -> Result<LegalMoves, TypesError> {
        match self {
            LegalMovesReply::Detailed {
                penalty_applied: true,
                game_state: Some(board),
                machine_move,
                ..
            } => Ok(LegalMoves::ForcedPass {
                board,
                opponent_move: machine_move,
            }),
            LegalMovesReply::Detailed {
                penalty_applied: true,
                game_state: None,
                ..
            } => Err(TypesError::MalformedReply(
                "penalty applied without a game state".into(),
            )),
            LegalMovesReply::Detailed { valid_moves, .. } => Ok(LegalMoves::Moves(valid_moves)),
            LegalMovesReply::Bare(moves) => Ok(LegalMoves::Moves(moves)),
        }
    }
}

/// Body of `POST /api/game/machine-move`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineMoveRequest {
    /// Current state
    pub game_state: BoardState,
}

/// Reply to `POST /api/game/machine-move`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachineMove {
    /// Destination the engine would choose
    #[serde(rename = "move")]
    pub square: Coord,
    /// Engine's evaluation of the resulting position
    #[serde(default)]
    pub evaluation: Option<f64>,
}

/// Reply to `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status word reported by the server
    #[serde(default)]
    pub status: String,
    /// Everything else the server reported
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

/// Body of a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason
    #[serde(default, alias = "detail")]
    pub message: Option<String>,
}

/// Decoded reply to a move submission.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    /// Authoritative state after the local move and any opponent reply
    pub board: BoardState,
    /// Opponent reply move, if any
    pub opponent_move: Option<Coord>,
}

impl From<MoveReply> for MoveOutcome {
    fn from(reply: MoveReply) -> Self {
        Self {
            board: reply.game_state,
            opponent_move: reply.machine_move,
        }
    }
}

/// Decoded reply to a legal-moves query.
#[derive(Debug, Clone, PartialEq)]
pub enum LegalMoves {
    /// The side may choose among these destinations.
    Moves(Vec<Coord>),
    /// The side had no move; the authority applied a penalty.
    ForcedPass {
        /// Authoritative state after the penalty
        board: BoardState,
        /// Opponent move played on the side's behalf, if any
        opponent_move: Option<Coord>,
    },
}
