//! # horses-core
//!
//! Pure turn-synchronization logic for the Smart Horses client (no I/O,
//! instant tests).
//!
//! ## Design Philosophy
//!
//! Everything here is **pure**: functions take input and produce output
//! without touching the network or the clock.
//! - [`apply_speculative`] projects a local move onto a board
//! - [`Session`] is the turn synchronizer's state machine: it takes an
//!   [`Event`] and returns its successor plus the [`Action`]s to perform
//! - [`TurnStatus`] derives what a player should be told about the board
//!
//! The I/O (remote calls, timers, task spawning) is performed by
//! `horses-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod session;
pub mod status;

pub use apply::apply_speculative;
pub use session::{Action, Event, GameEvent, Phase, Rejected, RequestTag, Session, SessionView};
pub use status::TurnStatus;
