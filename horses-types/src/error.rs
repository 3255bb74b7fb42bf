//! Error types for Smart Horses wire data.

use thiserror::Error;

/// Errors that can occur while building or decoding Smart Horses types.
#[derive(Debug, Error)]
pub enum TypesError {
    /// Row or column outside the 8x8 board
    #[error("coordinate out of range: ({row}, {col})")]
    InvalidCoordinate {
        /// Row as received
        row: i64,
        /// Column as received
        col: i64,
    },

    /// Board map key not of the form "row,col"
    #[error("invalid cell key: {0:?}")]
    InvalidCellKey(String),

    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Reply decoded but its shape makes no sense
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}
