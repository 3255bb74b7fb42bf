//! Text rendering of the board and parsing of player input.
//!
//! Squares are shown chess-style: files `a`-`h` left to right, ranks `8`-`1`
//! top to bottom, so row 0 is rank 8.

use smart_horses_core::SessionView;
use smart_horses_types::{BoardState, Cell, Coord, Difficulty, Side, BOARD_SIZE};
use std::fmt::Write;
use thiserror::Error;

/// A line typed at the `play` prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Move the local knight.
    Move(Coord),
    /// Ask the engine for its move on the current board.
    Hint,
    /// Reload and list legal moves.
    Moves,
    /// Start over, optionally at another difficulty.
    New(Option<Difficulty>),
    /// Show the command list.
    Help,
    /// Leave the game.
    Quit,
    /// Blank line.
    Empty,
}

/// Input that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// Not a square in either notation.
    #[error("not a square: {0:?} (try c6 or 2,3)")]
    BadSquare(String),
    /// Unknown difficulty after `new`.
    #[error("{0}")]
    BadDifficulty(String),
}

/// Parse a prompt line.
pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(Input::Empty);
    };

    match first.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Ok(Input::Quit),
        "hint" => Ok(Input::Hint),
        "moves" => Ok(Input::Moves),
        "help" | "?" => Ok(Input::Help),
        "new" => match words.next() {
            Some(level) => level
                .parse()
                .map(|d| Input::New(Some(d)))
                .map_err(InputError::BadDifficulty),
            None => Ok(Input::New(None)),
        },
        _ => parse_square(line).map(Input::Move),
    }
}

/// Parse `c6` or `2,3`.
pub fn parse_square(text: &str) -> Result<Coord, InputError> {
    let text = text.trim();
    if text.contains(',') {
        return text
            .parse()
            .map_err(|_| InputError::BadSquare(text.to_string()));
    }

    let bad = || InputError::BadSquare(text.to_string());
    let mut chars = text.chars();
    let file = chars.next().ok_or_else(bad)?.to_ascii_lowercase();
    let rank = chars.as_str().parse::<i64>().map_err(|_| bad())?;
    if !file.is_ascii_lowercase() {
        return Err(bad());
    }
    let col = i64::from(file as u8 - b'a');
    let row = i64::from(BOARD_SIZE) - rank;
    Coord::new(row, col).map_err(|_| bad())
}

/// Chess-style name of a square, e.g. `c6`.
pub fn square_name(square: Coord) -> String {
    let file = char::from(b'a' + square.col());
    let rank = BOARD_SIZE - square.row();
    format!("{file}{rank}")
}

fn side_name(side: Side) -> &'static str {
    match side {
        Side::White => "White",
        Side::Black => "Black",
    }
}

fn token(board: &BoardState, square: Coord) -> String {
    if let Some(side) = board.knight_at(square) {
        return match side {
            Side::White => "W".into(),
            Side::Black => "B".into(),
        };
    }
    match board.cell(square) {
        Cell::Empty => ".".into(),
        Cell::Destroyed => "#".into(),
        Cell::Points(points) => points.to_string(),
    }
}

/// Draw the board with legal moves marked `*` and the highlight in brackets.
pub fn board(view: &SessionView) -> String {
    let Some(board) = &view.board else {
        return "No game in progress.\n".to_string();
    };

    let mut out = String::from("    ");
    for col in 0..BOARD_SIZE {
        let _ = write!(out, "{:^5}", char::from(b'a' + col));
    }
    out.push('\n');

    for row in 0..BOARD_SIZE {
        let _ = write!(out, " {}  ", BOARD_SIZE - row);
        for col in 0..BOARD_SIZE {
            let Ok(square) = Coord::new(i64::from(row), i64::from(col)) else {
                continue;
            };
            let mut cell = token(board, square);
            if view.is_legal(square) {
                cell.push('*');
            }
            if view.highlight == Some(square) {
                cell = format!("[{cell}]");
            }
            let _ = write!(out, "{cell:^5}");
        }
        out.push('\n');
    }
    out
}

/// Score line plus turn status, pending marker and last error.
pub fn status(view: &SessionView) -> String {
    let Some(board) = &view.board else {
        return match &view.last_error {
            Some(error) => format!("Error: {error}\n"),
            None if view.pending => "Creating game...\n".to_string(),
            None => String::new(),
        };
    };

    let local = view.local_side;
    let opponent = local.opponent();
    let mut out = format!(
        "You ({}): {}  |  Machine ({}): {}",
        side_name(local),
        board.score(local),
        side_name(opponent),
        board.score(opponent),
    );
    if let Some(difficulty) = view.difficulty {
        let _ = write!(out, "  |  {difficulty}");
    }
    if let Some(status) = view.status() {
        let _ = write!(out, "\n{status}");
    }
    if view.pending {
        out.push_str(" (syncing...)");
    }
    out.push('\n');
    if let Some(error) = &view.last_error {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}

/// Comma-separated square names.
pub fn square_list(squares: &[Coord]) -> String {
    squares
        .iter()
        .map(|square| square_name(*square))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command summary for the `help` input.
pub const HELP: &str = "\
Commands:
  c6 or 2,3       move your knight to that square
  moves           list your legal moves
  hint            ask the engine for its move on this board
  new [level]     start over (beginner, amateur, expert)
  help            show this list
  quit            leave the game
";
