//! # horses-types
//!
//! Board state and wire format types for the Smart Horses client.
//!
//! This crate provides the foundational types shared by every other crate:
//! - [`Coord`] - A square on the 8x8 board
//! - [`BoardState`], [`Cell`], [`Side`], [`Winner`] - The authoritative snapshot
//! - [`Difficulty`] and the request/response messages of the remote game API
//! - [`MoveOutcome`], [`LegalMoves`], [`MachineMove`] - Decoded service replies
//! - [`TypesError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod board;
mod coord;
mod error;
mod messages;

pub use board::{BoardState, Cell, Side, Winner};
pub use coord::{Coord, BOARD_SIZE};
pub use error::TypesError;
pub use messages::{
    Difficulty, ErrorBody, HealthStatus, LegalMoves, LegalMovesReply, LegalMovesRequest,
    MachineMove, MachineMoveRequest, MoveOutcome, MoveReply, MoveRequest, NewGameRequest,
};
