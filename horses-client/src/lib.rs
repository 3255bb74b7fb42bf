//! # smart-horses-client
//!
//! Client library for the Smart Horses game authority.
//!
//! This is the library front-ends use to play against the remote engine.
//!
//! ## Features
//!
//! - **Optimistic moves**: local moves show immediately, then reconcile
//! - **Minimum display time**: the speculative board stays up long enough to read
//! - **Service Abstraction**: Pluggable game service (HTTP, mock)
//! - **Pure State Machine**: Uses smart-horses-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use smart_horses_client::{EngineConfig, HttpGameService, TurnSynchronizer};
//!
//! let service = HttpGameService::new("https://smart-horses-backend.onrender.com", timeout)?;
//! let engine = TurnSynchronizer::new(service, EngineConfig::default());
//!
//! engine.start_game(Difficulty::Beginner).await?;
//! engine.submit_local_move(destination).await?;
//! println!("{}", engine.view().status().unwrap());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod engine;
pub mod service;

pub use engine::{EngineConfig, EngineError, TurnSynchronizer};
pub use service::{
    GameService, HttpGameService, MockCall, MockGameService, ServiceError, CONNECT_FAILURE_MESSAGE,
    DEFAULT_SERVER_URL,
};
