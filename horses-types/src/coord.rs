//! Board coordinates.
//!
//! A [`Coord`] is a `(row, col)` pair with both parts in `0..8`. On the wire
//! it travels as a two-element JSON array (`[2, 3]`); as a key of the board's
//! cell map it is the string `"2,3"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Number of rows and columns on the board.
pub const BOARD_SIZE: u8 = 8;

/// A square on the board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "[i64; 2]", into = "[u8; 2]")]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    /// Create a coordinate, rejecting anything off the board.
    pub fn new(row: i64, col: i64) -> Result<Self, TypesError> {
        let size = i64::from(BOARD_SIZE);
        if (0..size).contains(&row) && (0..size).contains(&col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(TypesError::InvalidCoordinate { row, col })
        }
    }

    /// Row index (0 is the top row as rendered).
    pub fn row(self) -> u8 {
        self.row
    }

    /// Column index (0 is the leftmost file).
    pub fn col(self) -> u8 {
        self.col
    }

    /// Every square of the board in row-major order.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Coord { row, col }))
    }
}

impl TryFrom<[i64; 2]> for Coord {
    type Error = TypesError;

    fn try_from([row, col]: [i64; 2]) -> Result<Self, Self::Error> {
        Self::new(row, col)
    }
}

impl From<Coord> for [u8; 2] {
    fn from(coord: Coord) -> Self {
        [coord.row, coord.col]
    }
}

/// Renders the cell-map key form, `"row,col"`.
impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.row, self.col)
    }
}

impl fmt::Debug for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.row, self.col)
    }
}

/// Parses the cell-map key form, `"row,col"` (surrounding spaces allowed).
impl FromStr for Coord {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once(',')
            .ok_or_else(|| TypesError::InvalidCellKey(s.to_string()))?;
        let row: i64 = row
            .trim()
            .parse()
            .map_err(|_| TypesError::InvalidCellKey(s.to_string()))?;
        let col: i64 = col
            .trim()
            .parse()
            .map_err(|_| TypesError::InvalidCellKey(s.to_string()))?;
        Self::new(row, col)
    }
}
