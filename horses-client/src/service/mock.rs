//! Mock game service for testing.
//!
//! Allows queueing replies per operation and capturing calls for verification.

use super::{GameService, ServiceError};
use async_trait::async_trait;
use smart_horses_types::{
    BoardState, Coord, Difficulty, HealthStatus, LegalMoves, MachineMove, MoveOutcome, Side,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call received by [`MockGameService`].
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `create_game`
    CreateGame(Difficulty),
    /// `submit_move`
    SubmitMove {
        /// Board the move was chosen on
        before: BoardState,
        /// Chosen square
        destination: Coord,
    },
    /// `fetch_legal_moves`
    FetchLegalMoves {
        /// Queried board
        board: BoardState,
        /// Queried side
        side: Side,
    },
    /// `fetch_opponent_move`
    FetchOpponentMove(BoardState),
    /// `health`
    Health,
}

/// Mock game service for testing.
///
/// Allows queueing replies and capturing calls for verification. Clones share
/// state, so a test can keep a handle after giving one to the engine.
#[derive(Debug, Default)]
pub struct MockGameService {
    inner: Arc<Mutex<MockGameServiceInner>>,
}

#[derive(Debug, Default)]
struct MockGameServiceInner {
    calls: Vec<MockCall>,
    games: VecDeque<BoardState>,
    moves: VecDeque<MoveOutcome>,
    legal_moves: VecDeque<LegalMoves>,
    opponent_moves: VecDeque<MachineMove>,
    fail_next_create: Option<ServiceError>,
    fail_next_move: Option<ServiceError>,
    fail_next_legal_moves: Option<ServiceError>,
    fail_next_opponent_move: Option<ServiceError>,
    unhealthy: Option<ServiceError>,
    latency: Duration,
}

impl MockGameService {
    /// Create a new mock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a board to be returned by the next `create_game()` call.
    pub fn queue_game(&self, board: BoardState) {
        let mut inner = self.lock();
        inner.games.push_back(board);
    }

    /// Queue an outcome to be returned by the next `submit_move()` call.
    pub fn queue_move(&self, outcome: MoveOutcome) {
        let mut inner = self.lock();
        inner.moves.push_back(outcome);
    }

    /// Queue a reply to be returned by the next `fetch_legal_moves()` call.
    pub fn queue_legal_moves(&self, reply: LegalMoves) {
        let mut inner = self.lock();
        inner.legal_moves.push_back(reply);
    }

    /// Queue a reply to be returned by the next `fetch_opponent_move()` call.
    pub fn queue_opponent_move(&self, reply: MachineMove) {
        let mut inner = self.lock();
        inner.opponent_moves.push_back(reply);
    }

    /// Cause the next create_game() to fail with the given error.
    pub fn fail_next_create(&self, error: ServiceError) {
        let mut inner = self.lock();
        inner.fail_next_create = Some(error);
    }

    /// Cause the next submit_move() to fail with the given error.
    pub fn fail_next_move(&self, error: ServiceError) {
        let mut inner = self.lock();
        inner.fail_next_move = Some(error);
    }

    /// Cause the next fetch_legal_moves() to fail with the given error.
    pub fn fail_next_legal_moves(&self, error: ServiceError) {
        let mut inner = self.lock();
        inner.fail_next_legal_moves = Some(error);
    }

    /// Cause the next fetch_opponent_move() to fail with the given error.
    pub fn fail_next_opponent_move(&self, error: ServiceError) {
        let mut inner = self.lock();
        inner.fail_next_opponent_move = Some(error);
    }

    /// Make health() fail until cleared with `None`.
    pub fn set_unhealthy(&self, error: Option<ServiceError>) {
        let mut inner = self.lock();
        inner.unhealthy = error;
    }

    /// Delay every reply by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let mut inner = self.lock();
        inner.latency = latency;
    }

    /// Get all calls received so far.
    pub fn calls(&self) -> Vec<MockCall> {
        let inner = self.lock();
        inner.calls.clone()
    }

    /// Get the last call received.
    pub fn last_call(&self) -> Option<MockCall> {
        let inner = self.lock();
        inner.calls.last().cloned()
    }

    /// Clear all state (calls, queues, failures).
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = MockGameServiceInner::default();
    }

    fn lock(&self) -> MutexGuard<'_, MockGameServiceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `call`, pick the reply under the lock, then wait out the latency.
    async fn respond<T>(
        &self,
        call: MockCall,
        pick: impl FnOnce(&mut MockGameServiceInner) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let (reply, latency) = {
            let mut inner = self.lock();
            inner.calls.push(call);
            (pick(&mut inner), inner.latency)
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        reply
    }
}

impl Clone for MockGameService {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn nothing_queued(operation: &str) -> ServiceError {
    ServiceError::Malformed(format!("no {operation} reply queued"))
}

#[async_trait]
impl GameService for MockGameService {
    async fn create_game(&self, difficulty: Difficulty) -> Result<BoardState, ServiceError> {
        self.respond(MockCall::CreateGame(difficulty), |inner| {
            // Check for forced failure
            if let Some(error) = inner.fail_next_create.take() {
                return Err(error);
            }
            inner
                .games
                .pop_front()
                .ok_or_else(|| nothing_queued("create_game"))
        })
        .await
    }

    async fn submit_move(
        &self,
        before: &BoardState,
        destination: Coord,
    ) -> Result<MoveOutcome, ServiceError> {
        let call = MockCall::SubmitMove {
            before: before.clone(),
            destination,
        };
        self.respond(call, |inner| {
            if let Some(error) = inner.fail_next_move.take() {
                return Err(error);
            }
            inner
                .moves
                .pop_front()
                .ok_or_else(|| nothing_queued("submit_move"))
        })
        .await
    }

    async fn fetch_legal_moves(
        &self,
        board: &BoardState,
        side: Side,
    ) -> Result<LegalMoves, ServiceError> {
        let call = MockCall::FetchLegalMoves {
            board: board.clone(),
            side,
        };
        self.respond(call, |inner| {
            if let Some(error) = inner.fail_next_legal_moves.take() {
                return Err(error);
            }
            inner
                .legal_moves
                .pop_front()
                .ok_or_else(|| nothing_queued("fetch_legal_moves"))
        })
        .await
    }

    async fn fetch_opponent_move(&self, board: &BoardState) -> Result<MachineMove, ServiceError> {
        self.respond(MockCall::FetchOpponentMove(board.clone()), |inner| {
            if let Some(error) = inner.fail_next_opponent_move.take() {
                return Err(error);
            }
            inner
                .opponent_moves
                .pop_front()
                .ok_or_else(|| nothing_queued("fetch_opponent_move"))
        })
        .await
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        self.respond(MockCall::Health, |inner| match &inner.unhealthy {
            Some(error) => Err(error.clone()),
            None => Ok(HealthStatus {
                status: "healthy".into(),
                details: Default::default(),
            }),
        })
        .await
    }
}
