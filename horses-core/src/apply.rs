//! Speculative application of a local move.
//!
//! The projection is what the player sees while the authority is still
//! thinking. It is never reconciled field by field: the authority's answer
//! replaces it wholesale, so outcomes this function cannot predict (the
//! opponent's reply, penalties) need no handling here.

use smart_horses_types::{BoardState, Cell, Coord, Side};

/// Project the side to move onto `destination`.
///
/// The mover is `board.current_player`. Its origin square becomes
/// [`Cell::Destroyed`], a point value on the destination is added to its
/// score and the square is emptied, and the turn passes to the other side.
///
/// Legality of `destination` is the caller's responsibility. The input is
/// left untouched.
pub fn apply_speculative(board: &BoardState, destination: Coord) -> BoardState {
    let mover = board.current_player;
    let mut next = board.clone();

    if let Some(origin) = board.knight(mover) {
        next.cells.insert(origin, Cell::Destroyed);
    }

    if let Cell::Points(value) = board.cell(destination) {
        let score = match mover {
            Side::White => &mut next.white_score,
            Side::Black => &mut next.black_score,
        };
        *score = score.saturating_add(value);
        next.cells.insert(destination, Cell::Empty);
    }

    match mover {
        Side::White => next.white_knight = Some(destination),
        Side::Black => next.black_knight = Some(destination),
    }
    next.current_player = mover.opponent();

    next
}
