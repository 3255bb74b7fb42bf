//! Remote game service abstraction.
//!
//! The game authority owns the rules and the opponent engine. This module
//! provides a pluggable layer over how it is reached (HTTP, mock for testing).
//!
//! # Design
//!
//! The service trait is async and stateless: every call carries the full board
//! it concerns, so calls can be retried or discarded freely.
//! - `create_game()` returns a fresh board
//! - `submit_move()` returns the board after the move and the opponent's reply
//! - `fetch_legal_moves()` returns destinations or a forced pass
//! - `fetch_opponent_move()` asks the engine what it would play
//! - `health()` probes the server
//!
//! # Example
//!
//! ```ignore
//! let service = MockGameService::new();
//! service.queue_game(board);
//! let board = service.create_game(Difficulty::Beginner).await?;
//! ```

mod http;
mod mock;

pub use http::{HttpGameService, DEFAULT_SERVER_URL};
pub use mock::{MockCall, MockGameService};

use async_trait::async_trait;
use smart_horses_types::{
    BoardState, Coord, Difficulty, HealthStatus, LegalMoves, MachineMove, MoveOutcome, Side,
};
use thiserror::Error;

/// User-facing message for an unreachable server.
pub const CONNECT_FAILURE_MESSAGE: &str =
    "Cannot connect to game server. Please check your internet connection.";

/// Game service errors.
///
/// Messages are shown to the player verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The server could not be reached.
    #[error("{0}")]
    Unreachable(String),

    /// The server answered with a failure status.
    #[error("{0}")]
    Rejected(String),

    /// The server answered with a body that could not be decoded.
    #[error("unexpected response from game server: {0}")]
    Malformed(String),

    /// No answer within the configured timeout.
    #[error("game server did not respond in time")]
    Timeout,

    /// The service could not be set up.
    #[error("invalid service configuration: {0}")]
    InvalidConfig(String),
}

impl ServiceError {
    /// The server could not be reached, with the standard message.
    pub fn unreachable() -> Self {
        ServiceError::Unreachable(CONNECT_FAILURE_MESSAGE.to_string())
    }

    /// Message to surface to the player.
    ///
    /// Undecodable replies read as a connectivity problem; the detail is only
    /// logged.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Malformed(_) => CONNECT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ServiceError::Timeout
        } else if error.is_decode() {
            ServiceError::Malformed(error.to_string())
        } else if error.is_builder() {
            ServiceError::InvalidConfig(error.to_string())
        } else {
            ServiceError::unreachable()
        }
    }
}

impl From<smart_horses_types::TypesError> for ServiceError {
    fn from(error: smart_horses_types::TypesError) -> Self {
        ServiceError::Malformed(error.to_string())
    }
}

/// Game service trait for talking to the game authority.
///
/// Implementations handle the underlying transport and must be thread-safe.
#[async_trait]
pub trait GameService: Send + Sync {
    /// Create a new game at the given strength.
    async fn create_game(&self, difficulty: Difficulty) -> Result<BoardState, ServiceError>;

    /// Play `destination` for the side to move on `before`.
    async fn submit_move(
        &self,
        before: &BoardState,
        destination: Coord,
    ) -> Result<MoveOutcome, ServiceError>;

    /// Legal destinations of `side` on `board`, or a forced pass.
    async fn fetch_legal_moves(
        &self,
        board: &BoardState,
        side: Side,
    ) -> Result<LegalMoves, ServiceError>;

    /// The move the opponent engine would play on `board`.
    async fn fetch_opponent_move(&self, board: &BoardState) -> Result<MachineMove, ServiceError>;

    /// Probe the server.
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
}
