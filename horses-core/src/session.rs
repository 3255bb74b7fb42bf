//! Turn synchronizer state machine for the Smart Horses client.
//!
//! This module provides a pure, side-effect-free state machine for the move
//! lifecycle. [`Session::on_event`] takes an [`Event`] and returns the new
//! session plus a list of [`Action`]s to execute.
//!
//! The actual I/O (remote calls, the minimum display timer, highlight timers)
//! is performed by horses-client, not by this module.
//!
//! # Ordering
//!
//! Every remote request carries a [`RequestTag`] made of the session epoch
//! (bumped by reset and new game) and the move sequence (bumped by every local
//! move and forced pass). A response whose tag no longer matches is discarded,
//! so a late answer can never overwrite a newer board.
//!
//! Highlights are keyed the same way: a scheduled highlight only shows if its
//! sequence is still the latest, and a scheduled clear only removes the exact
//! highlight it was paired with.

use smart_horses_types::{BoardState, Coord, Difficulty, LegalMoves, MoveOutcome, Side, Winner};
use std::mem;
use thiserror::Error;
use tracing::debug;

use crate::apply::apply_speculative;
use crate::status::TurnStatus;

/// Identifies the session generation a remote request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    epoch: u64,
    sequence: u64,
}

impl RequestTag {
    /// Session epoch at request time.
    pub fn epoch(self) -> u64 {
        self.epoch
    }

    /// Move sequence at request time.
    pub fn sequence(self) -> u64 {
        self.sequence
    }
}

/// Why a trigger was refused without touching the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    /// No board installed.
    #[error("no game in progress")]
    NoGame,
    /// The game has ended.
    #[error("game is over")]
    GameOver,
    /// The remote side is to move.
    #[error("not your turn")]
    NotYourTurn,
    /// A local move is still awaiting the authority.
    #[error("a move is already being processed")]
    MoveInFlight,
    /// Destination not in the legal-move cache.
    #[error("illegal destination: {0:?}")]
    IllegalDestination(Coord),
    /// A game creation is still awaiting the authority.
    #[error("a new game is already being created")]
    CreationPending,
}

/// Whether the installed board is confirmed by the authority.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// The board came from the authority.
    Authoritative,
    /// The board is a local projection awaiting the authority.
    Speculative {
        /// Request that will confirm or refute the projection.
        tag: RequestTag,
        /// Board the move was chosen on.
        before: BoardState,
        /// Legal-move cache of that turn, restored on rollback.
        cached_moves: Vec<Coord>,
    },
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Player asked for a new game.
    StartRequested {
        /// Requested opponent strength.
        difficulty: Difficulty,
    },
    /// Create-game call finished.
    GameCreated {
        /// Tag of the originating request.
        tag: RequestTag,
        /// Strength that was requested.
        difficulty: Difficulty,
        /// New board, or a user-facing failure message.
        result: Result<BoardState, String>,
    },
    /// Player chose a destination.
    MoveRequested {
        /// Chosen square.
        destination: Coord,
    },
    /// Submit-move call and minimum display time both finished.
    MoveResolved {
        /// Tag of the originating request.
        tag: RequestTag,
        /// Authoritative outcome, or a user-facing failure message.
        result: Result<MoveOutcome, String>,
    },
    /// Legal moves should be (re)loaded.
    RefreshRequested,
    /// Legal-moves call finished.
    LegalMovesResolved {
        /// Tag of the originating request.
        tag: RequestTag,
        /// Decoded reply, or a failure message.
        result: Result<LegalMoves, String>,
    },
    /// Highlight delay elapsed.
    HighlightShown {
        /// Sequence that scheduled the highlight.
        sequence: u64,
        /// Square to highlight.
        square: Coord,
    },
    /// Highlight hold time elapsed.
    HighlightExpired {
        /// Sequence that scheduled the highlight.
        sequence: u64,
        /// Square that was highlighted.
        square: Coord,
    },
    /// The driver of a request went away before it could report back.
    RequestAbandoned {
        /// Tag of the abandoned request.
        tag: RequestTag,
    },
    /// Player asked to drop the current game.
    ResetRequested,
}

/// Actions to be executed by horses-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Call create-game and report back with [`Event::GameCreated`].
    CreateGame {
        /// Tag to echo back.
        tag: RequestTag,
        /// Requested opponent strength.
        difficulty: Difficulty,
    },
    /// Call submit-move joined with the minimum display timer and report
    /// back with [`Event::MoveResolved`].
    SubmitMove {
        /// Tag to echo back.
        tag: RequestTag,
        /// Board the move was chosen on.
        before: BoardState,
        /// Chosen square.
        destination: Coord,
    },
    /// Call fetch-legal-moves and report back with
    /// [`Event::LegalMovesResolved`].
    FetchLegalMoves {
        /// Tag to echo back.
        tag: RequestTag,
        /// Board to query.
        board: BoardState,
    },
    /// After the highlight delay report [`Event::HighlightShown`], then after
    /// the hold time [`Event::HighlightExpired`].
    ScheduleHighlight {
        /// Sequence to echo back.
        sequence: u64,
        /// Square to highlight.
        square: Coord,
    },
    /// Abort every scheduled highlight.
    CancelHighlights,
    /// Emit an event to the presentation layer.
    EmitEvent(GameEvent),
}

/// Events emitted to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// A new game is on the board.
    GameStarted {
        /// Opponent strength.
        difficulty: Difficulty,
    },
    /// Creating a game failed.
    StartFailed {
        /// User-facing reason.
        reason: String,
    },
    /// A knight moved (local moves on submit, opponent moves when highlighted).
    PieceMoved {
        /// Side that moved.
        side: Side,
        /// Destination square.
        square: Coord,
    },
    /// A local move was refused or could not be delivered and was rolled back.
    MoveFailed {
        /// User-facing reason.
        reason: String,
    },
    /// The side had no legal move and was penalised.
    PenaltyApplied {
        /// Penalised side.
        side: Side,
    },
    /// The game ended.
    GameOver {
        /// Final result.
        outcome: Winner,
    },
}

/// Read-only snapshot of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Installed board, speculative or authoritative.
    pub board: Option<BoardState>,
    /// Legal destinations for the local side this turn.
    pub legal_moves: Vec<Coord>,
    /// A game creation or move submission is outstanding.
    pub pending: bool,
    /// Last surfaced failure.
    pub last_error: Option<String>,
    /// Transiently highlighted square.
    pub highlight: Option<Coord>,
    /// Strength of the current game.
    pub difficulty: Option<Difficulty>,
    /// `board` is a local projection.
    pub speculative: bool,
    /// Side the local player controls.
    pub local_side: Side,
}

impl SessionView {
    /// Turn status of the installed board.
    pub fn status(&self) -> Option<TurnStatus> {
        self.board
            .as_ref()
            .map(|board| TurnStatus::of(board, self.local_side))
    }

    /// Whether `square` is in the legal-move cache.
    pub fn is_legal(&self, square: Coord) -> bool {
        self.legal_moves.contains(&square)
    }
}

/// Client-side game session. Pure state: every transition goes through
/// [`Session::on_event`].
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    local_side: Side,
    board: Option<BoardState>,
    phase: Phase,
    legal_moves: Vec<Coord>,
    creating: bool,
    last_error: Option<String>,
    /// Highlighted square and the sequence that put it there.
    highlight: Option<(u64, Coord)>,
    difficulty: Option<Difficulty>,
    epoch: u64,
    sequence: u64,
}

impl Session {
    /// Create an empty session for a local player controlling `local_side`.
    pub fn new(local_side: Side) -> Self {
        Self {
            local_side,
            board: None,
            phase: Phase::Authoritative,
            legal_moves: Vec::new(),
            creating: false,
            last_error: None,
            highlight: None,
            difficulty: None,
            epoch: 0,
            sequence: 0,
        }
    }

    /// Process an event and return the new session plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (horses-client)
    /// is responsible for executing the returned actions.
    pub fn on_event(mut self, event: Event) -> (Self, Vec<Action>) {
        let actions = match event {
            Event::StartRequested { difficulty } => self.start(difficulty),
            Event::GameCreated {
                tag,
                difficulty,
                result,
            } => self.game_created(tag, difficulty, result),
            Event::MoveRequested { destination } => self.move_requested(destination),
            Event::MoveResolved { tag, result } => self.move_resolved(tag, result),
            Event::RefreshRequested => self.refresh(),
            Event::LegalMovesResolved { tag, result } => self.legal_moves_resolved(tag, result),
            Event::HighlightShown { sequence, square } => self.highlight_shown(sequence, square),
            Event::HighlightExpired { sequence, square } => {
                if self.highlight == Some((sequence, square)) {
                    self.highlight = None;
                }
                vec![]
            }
            Event::RequestAbandoned { tag } => self.abandoned(tag),
            Event::ResetRequested => {
                let local_side = self.local_side;
                let (epoch, sequence) = (self.epoch + 1, self.sequence + 1);
                self = Self {
                    epoch,
                    sequence,
                    ..Self::new(local_side)
                };
                vec![Action::CancelHighlights]
            }
        };
        (self, actions)
    }

    /// Check whether a new game may be requested now.
    pub fn check_start(&self) -> Result<(), Rejected> {
        if self.creating {
            Err(Rejected::CreationPending)
        } else {
            Ok(())
        }
    }

    /// Check whether a local move to `destination` would be accepted.
    pub fn check_move(&self, destination: Coord) -> Result<(), Rejected> {
        let board = self.board.as_ref().ok_or(Rejected::NoGame)?;
        if board.game_over {
            return Err(Rejected::GameOver);
        }
        if matches!(self.phase, Phase::Speculative { .. }) {
            return Err(Rejected::MoveInFlight);
        }
        if board.current_player != self.local_side {
            return Err(Rejected::NotYourTurn);
        }
        if !self.legal_moves.contains(&destination) {
            return Err(Rejected::IllegalDestination(destination));
        }
        Ok(())
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> SessionView {
        SessionView {
            board: self.board.clone(),
            legal_moves: self.legal_moves.clone(),
            pending: self.is_pending(),
            last_error: self.last_error.clone(),
            highlight: self.highlight(),
            difficulty: self.difficulty,
            speculative: matches!(self.phase, Phase::Speculative { .. }),
            local_side: self.local_side,
        }
    }

    /// Installed board.
    pub fn board(&self) -> Option<&BoardState> {
        self.board.as_ref()
    }

    /// Legal-move cache.
    pub fn legal_moves(&self) -> &[Coord] {
        &self.legal_moves
    }

    /// Whether a game creation or move submission is outstanding.
    pub fn is_pending(&self) -> bool {
        self.creating || matches!(self.phase, Phase::Speculative { .. })
    }

    /// Last surfaced failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Highlighted square.
    pub fn highlight(&self) -> Option<Coord> {
        self.highlight.map(|(_, square)| square)
    }

    /// Confirmation state of the board.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Side the local player controls.
    pub fn local_side(&self) -> Side {
        self.local_side
    }

    fn current_tag(&self) -> RequestTag {
        RequestTag {
            epoch: self.epoch,
            sequence: self.sequence,
        }
    }

    fn is_local_turn(&self) -> bool {
        matches!(self.phase, Phase::Authoritative)
            && self
                .board
                .as_ref()
                .is_some_and(|board| board.is_turn_of(self.local_side))
    }

    /// Follow-up after an authoritative board was installed: announce the
    /// end of the game, or load legal moves if the local side is to move.
    fn after_authoritative(&self, actions: &mut Vec<Action>) {
        let Some(board) = &self.board else {
            return;
        };
        if let Some(outcome) = board.outcome() {
            actions.push(Action::EmitEvent(GameEvent::GameOver { outcome }));
        } else if self.is_local_turn() {
            actions.push(Action::FetchLegalMoves {
                tag: self.current_tag(),
                board: board.clone(),
            });
        }
    }

    fn start(&mut self, difficulty: Difficulty) -> Vec<Action> {
        if self.creating {
            debug!(%difficulty, "game creation already pending");
            return vec![];
        }

        self.epoch += 1;
        self.sequence += 1;
        self.board = None;
        self.phase = Phase::Authoritative;
        self.legal_moves.clear();
        self.highlight = None;
        self.last_error = None;
        self.difficulty = None;
        self.creating = true;

        vec![
            Action::CancelHighlights,
            Action::CreateGame {
                tag: self.current_tag(),
                difficulty,
            },
        ]
    }

    fn game_created(
        &mut self,
        tag: RequestTag,
        difficulty: Difficulty,
        result: Result<BoardState, String>,
    ) -> Vec<Action> {
        if !self.creating || tag != self.current_tag() {
            debug!(?tag, "discarding stale game creation");
            return vec![];
        }
        self.creating = false;

        match result {
            Ok(board) => {
                self.board = Some(board);
                self.difficulty = Some(difficulty);
                self.legal_moves.clear();
                self.highlight = None;
                self.last_error = None;

                let mut actions = vec![Action::EmitEvent(GameEvent::GameStarted { difficulty })];
                self.after_authoritative(&mut actions);
                actions
            }
            Err(reason) => {
                self.last_error = Some(reason.clone());
                vec![Action::EmitEvent(GameEvent::StartFailed { reason })]
            }
        }
    }

    fn move_requested(&mut self, destination: Coord) -> Vec<Action> {
        if let Err(reason) = self.check_move(destination) {
            debug!(%reason, "ignoring move request");
            return vec![];
        }
        let Some(before) = self.board.take() else {
            return vec![];
        };

        let projected = apply_speculative(&before, destination);
        self.sequence += 1;
        let tag = self.current_tag();

        self.phase = Phase::Speculative {
            tag,
            before: before.clone(),
            cached_moves: mem::take(&mut self.legal_moves),
        };
        self.board = Some(projected);
        self.highlight = Some((self.sequence, destination));
        self.last_error = None;

        vec![
            Action::EmitEvent(GameEvent::PieceMoved {
                side: self.local_side,
                square: destination,
            }),
            Action::SubmitMove {
                tag,
                before,
                destination,
            },
        ]
    }

    fn move_resolved(&mut self, tag: RequestTag, result: Result<MoveOutcome, String>) -> Vec<Action> {
        let (before, cached_moves) = match mem::replace(&mut self.phase, Phase::Authoritative) {
            Phase::Speculative {
                tag: expected,
                before,
                cached_moves,
            } if expected == tag => (before, cached_moves),
            other => {
                self.phase = other;
                debug!(?tag, "discarding stale move response");
                return vec![];
            }
        };

        let mut actions = Vec::new();
        match result {
            Ok(outcome) => {
                self.board = Some(outcome.board);
                self.legal_moves.clear();
                match outcome.opponent_move {
                    Some(square) => actions.push(Action::ScheduleHighlight {
                        sequence: self.sequence,
                        square,
                    }),
                    None => self.highlight = None,
                }
                self.after_authoritative(&mut actions);
            }
            Err(reason) => {
                self.rollback(before, cached_moves);
                self.last_error = Some(reason.clone());
                actions.push(Action::EmitEvent(GameEvent::MoveFailed { reason }));
                if self.legal_moves.is_empty() {
                    self.after_authoritative(&mut actions);
                }
            }
        }
        actions
    }

    fn refresh(&mut self) -> Vec<Action> {
        if !self.is_local_turn() {
            self.legal_moves.clear();
            return vec![];
        }
        match &self.board {
            Some(board) => vec![Action::FetchLegalMoves {
                tag: self.current_tag(),
                board: board.clone(),
            }],
            None => vec![],
        }
    }

    fn legal_moves_resolved(
        &mut self,
        tag: RequestTag,
        result: Result<LegalMoves, String>,
    ) -> Vec<Action> {
        if tag != self.current_tag() || !self.is_local_turn() {
            debug!(?tag, "discarding stale legal moves");
            return vec![];
        }

        match result {
            Ok(LegalMoves::Moves(moves)) => {
                self.legal_moves = moves;
                vec![]
            }
            Ok(LegalMoves::ForcedPass {
                board,
                opponent_move,
            }) => {
                self.board = Some(board);
                self.legal_moves.clear();
                self.sequence += 1;

                let mut actions = vec![Action::EmitEvent(GameEvent::PenaltyApplied {
                    side: self.local_side,
                })];
                // Highlight tasks of earlier sequences no longer fire.
                match opponent_move {
                    Some(square) => actions.push(Action::ScheduleHighlight {
                        sequence: self.sequence,
                        square,
                    }),
                    None => self.highlight = None,
                }
                self.after_authoritative(&mut actions);
                actions
            }
            Err(reason) => {
                debug!(%reason, "legal moves unavailable");
                self.legal_moves.clear();
                vec![]
            }
        }
    }

    fn highlight_shown(&mut self, sequence: u64, square: Coord) -> Vec<Action> {
        if sequence != self.sequence || self.board.is_none() {
            debug!(sequence, "discarding superseded highlight");
            return vec![];
        }
        self.highlight = Some((sequence, square));
        vec![Action::EmitEvent(GameEvent::PieceMoved {
            side: self.local_side.opponent(),
            square,
        })]
    }

    fn abandoned(&mut self, tag: RequestTag) -> Vec<Action> {
        if self.creating && tag == self.current_tag() {
            debug!(?tag, "game creation abandoned");
            self.creating = false;
            return vec![];
        }

        match mem::replace(&mut self.phase, Phase::Authoritative) {
            Phase::Speculative {
                tag: expected,
                before,
                cached_moves,
            } if expected == tag => {
                debug!(?tag, "move abandoned, rolling back");
                self.rollback(before, cached_moves);
                let mut actions = Vec::new();
                if self.legal_moves.is_empty() {
                    self.after_authoritative(&mut actions);
                }
                actions
            }
            other => {
                self.phase = other;
                vec![]
            }
        }
    }

    fn rollback(&mut self, before: BoardState, cached_moves: Vec<Coord>) {
        self.board = Some(before);
        self.legal_moves = cached_moves;
        self.highlight = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Side::Black)
    }
}
