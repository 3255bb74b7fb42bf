//! The board state snapshot shared by the client and the remote authority.
//!
//! The authority is stateless: it receives the full [`BoardState`] with every
//! request and answers with a new one. Fields this crate does not model are
//! kept in [`BoardState::extra`] so they survive the round trip unchanged.

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::Coord;

/// One of the two knights.
///
/// `White` is the remote machine and `Black` the local player in the
/// default setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Side A.
    White,
    /// Side B.
    Black,
}

impl Side {
    /// The other side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Wire name of the side.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    /// White collected more points.
    White,
    /// Black collected more points.
    Black,
    /// Equal scores.
    Draw,
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Winner::White,
            Side::Black => Winner::Black,
        }
    }
}

/// Content of a single square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    /// Nothing on the square.
    #[default]
    Empty,
    /// A signed point value, collected by the knight that lands here.
    Points(i32),
    /// A square a knight has left. Never reverts.
    Destroyed,
}

impl Cell {
    /// Whether a knight may still land here.
    pub fn is_destroyed(self) -> bool {
        matches!(self, Cell::Destroyed)
    }

    /// Point value, if any.
    pub fn points(self) -> Option<i32> {
        match self {
            Cell::Points(value) => Some(value),
            _ => None,
        }
    }
}

const DESTROYED: &str = "destroyed";

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Empty => serializer.serialize_none(),
            Cell::Points(value) => serializer.serialize_i32(*value),
            Cell::Destroyed => serializer.serialize_str(DESTROYED),
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "null, an integer point value or {DESTROYED:?}")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::Empty)
    }

    fn visit_none<E: de::Error>(self) -> Result<Cell, E> {
        Ok(Cell::Empty)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Cell, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Cell, E> {
        i32::try_from(value)
            .map(Cell::Points)
            .map_err(|_| E::custom(format!("point value out of range: {value}")))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Cell, E> {
        i32::try_from(value)
            .map(Cell::Points)
            .map_err(|_| E::custom(format!("point value out of range: {value}")))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Cell, E> {
        if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
            Ok(Cell::Points(value as i32))
        } else {
            Err(E::custom(format!("point value is not an integer: {value}")))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Cell, E> {
        if value == DESTROYED {
            Ok(Cell::Destroyed)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(value), &self))
        }
    }
}

/// Authoritative snapshot of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    /// Square contents. Missing keys are empty squares.
    #[serde(rename = "board", with = "cell_map")]
    pub cells: BTreeMap<Coord, Cell>,
    /// White knight position, absent if not on the board.
    pub white_knight: Option<Coord>,
    /// Black knight position, absent if not on the board.
    pub black_knight: Option<Coord>,
    /// Points collected by white.
    pub white_score: i32,
    /// Points collected by black.
    pub black_score: i32,
    /// Side to move.
    pub current_player: Side,
    /// Whether the game has ended.
    #[serde(default)]
    pub game_over: bool,
    /// Winner, meaningful only when `game_over` (absent means a draw).
    #[serde(default)]
    pub winner: Option<Winner>,
    /// Fields sent by the authority that this client does not interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BoardState {
    /// Content of a square.
    pub fn cell(&self, square: Coord) -> Cell {
        self.cells.get(&square).copied().unwrap_or_default()
    }

    /// Position of a side's knight.
    pub fn knight(&self, side: Side) -> Option<Coord> {
        match side {
            Side::White => self.white_knight,
            Side::Black => self.black_knight,
        }
    }

    /// Score of a side.
    pub fn score(&self, side: Side) -> i32 {
        match side {
            Side::White => self.white_score,
            Side::Black => self.black_score,
        }
    }

    /// Which knight, if any, stands on a square.
    pub fn knight_at(&self, square: Coord) -> Option<Side> {
        if self.white_knight == Some(square) {
            Some(Side::White)
        } else if self.black_knight == Some(square) {
            Some(Side::Black)
        } else {
            None
        }
    }

    /// Whether `side` may move now.
    pub fn is_turn_of(&self, side: Side) -> bool {
        !self.game_over && self.current_player == side
    }

    /// Final result, if the game is over.
    pub fn outcome(&self) -> Option<Winner> {
        self.game_over.then(|| self.winner.unwrap_or(Winner::Draw))
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>, crate::TypesError> {
        serde_json::to_vec(self).map_err(crate::TypesError::Serialization)
    }

    /// Deserialize from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, crate::TypesError> {
        serde_json::from_slice(bytes).map_err(crate::TypesError::Deserialization)
    }
}

/// The cell map travels as a JSON object keyed by `"row,col"`.
mod cell_map {
    use super::{Cell, Coord};
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        cells: &BTreeMap<Coord, Cell>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(cells.len()))?;
        for (square, cell) in cells {
            map.serialize_entry(&square.to_string(), cell)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Coord, Cell>, D::Error> {
        let raw = BTreeMap::<String, Cell>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, cell)| {
                key.parse::<Coord>()
                    .map(|square| (square, cell))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sq(row: i64, col: i64) -> Coord {
        Coord::new(row, col).unwrap()
    }

    fn sample_json() -> serde_json::Value {
        json!({
            "board": {
                "0,0": 3,
                "1,2": -4,
                "2,3": "destroyed",
                "4,4": null
            },
            "white_knight": [0, 1],
            "black_knight": [7, 6],
            "white_score": 2,
            "black_score": -1,
            "current_player": "black",
            "game_over": false,
            "winner": null,
            "difficulty": "expert",
            "depth": 6
        })
    }

    // ===========================================
    // Decoding Tests
    // ===========================================

    #[test]
    fn decodes_authority_snapshot() {
        let board: BoardState = serde_json::from_value(sample_json()).unwrap();

        assert_eq!(board.cell(sq(0, 0)), Cell::Points(3));
        assert_eq!(board.cell(sq(1, 2)), Cell::Points(-4));
        assert_eq!(board.cell(sq(2, 3)), Cell::Destroyed);
        assert_eq!(board.cell(sq(4, 4)), Cell::Empty);
        assert_eq!(board.cell(sq(5, 5)), Cell::Empty, "missing key is empty");
        assert_eq!(board.knight(Side::White), Some(sq(0, 1)));
        assert_eq!(board.knight(Side::Black), Some(sq(7, 6)));
        assert_eq!(board.score(Side::Black), -1);
        assert!(board.is_turn_of(Side::Black));
        assert_eq!(board.outcome(), None);
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let board: BoardState = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(board.extra.get("difficulty"), Some(&json!("expert")));

        let encoded = serde_json::to_value(&board).unwrap();
        assert_eq!(encoded["depth"], json!(6));
        assert_eq!(encoded["board"]["2,3"], json!("destroyed"));
        assert_eq!(encoded["white_knight"], json!([0, 1]));
    }

    #[test]
    fn rejects_unknown_cell_marker() {
        let mut value = sample_json();
        value["board"]["0,0"] = json!("lava");
        assert!(serde_json::from_value::<BoardState>(value).is_err());
    }

    #[test]
    fn rejects_bad_cell_key() {
        let mut value = sample_json();
        value["board"]["9,9"] = json!(1);
        assert!(serde_json::from_value::<BoardState>(value).is_err());
    }

    #[test]
    fn captured_knight_is_null() {
        let mut value = sample_json();
        value["white_knight"] = json!(null);
        let board: BoardState = serde_json::from_value(value).unwrap();
        assert_eq!(board.knight(Side::White), None);
    }

    // ===========================================
    // Outcome Tests
    // ===========================================

    #[test]
    fn missing_winner_on_finished_game_is_draw() {
        let mut value = sample_json();
        value["game_over"] = json!(true);
        let board: BoardState = serde_json::from_value(value).unwrap();
        assert_eq!(board.outcome(), Some(Winner::Draw));
        assert!(!board.is_turn_of(Side::Black));
    }

    #[test]
    fn explicit_winner_is_reported() {
        let mut value = sample_json();
        value["game_over"] = json!(true);
        value["winner"] = json!("white");
        let board: BoardState = serde_json::from_value(value).unwrap();
        assert_eq!(board.outcome(), Some(Winner::White));
    }

    #[test]
    fn knight_at_finds_each_side() {
        let board: BoardState = serde_json::from_value(sample_json()).unwrap();
        assert_eq!(board.knight_at(sq(0, 1)), Some(Side::White));
        assert_eq!(board.knight_at(sq(7, 6)), Some(Side::Black));
        assert_eq!(board.knight_at(sq(3, 3)), None);
    }

    #[test]
    fn side_helpers() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.to_string(), "black");
        assert_eq!(Winner::from(Side::White), Winner::White);
    }
}
