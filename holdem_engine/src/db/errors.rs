//! Persistence error types.

use thiserror::Error;

use crate::game::entities::{Chips, RoomId};

/// Errors from the state store and the balance ledger
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Game state could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No saved game for the room
    #[error("Game not found for room {0}")]
    NotFound(RoomId),

    /// Ledger has no account for the user
    #[error("Unknown user {0}")]
    UnknownUser(i64),

    /// Balance doesn't fit the ledger's column type
    #[error("Balance out of range: {0}")]
    BalanceOutOfRange(Chips),

    /// Backend refused the write
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;
