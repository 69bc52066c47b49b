//! Room service error types.

use thiserror::Error;

use crate::{
    db::StoreError,
    game::{GameError, entities::RoomId},
};

/// Room service errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// Request broke a game rule
    #[error(transparent)]
    Game(#[from] GameError),

    /// State store or ledger write failed; in-memory changes were undone
    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),

    /// No such room in the registry or the state store
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),
}

impl RoomError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Store errors are sanitized to prevent information disclosure about
    /// the internal system structure, and room IDs are redacted.
    pub fn client_message(&self) -> String {
        match self {
            RoomError::Store(_) => "Internal server error".to_string(),
            RoomError::RoomNotFound(_) => "Room not found".to_string(),
            // Game rule messages are meant for players
            RoomError::Game(err) => err.to_string(),
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_game_errors_pass_through_verbatim() {
        let err = RoomError::from(GameError::InvalidTurn);
        assert_eq!(err.client_message(), "invalid player's turn");
        let err = RoomError::from(GameError::OverBalance);
        assert_eq!(
            err.client_message(),
            "betting amount is more than player's balance"
        );
    }

    #[test]
    fn test_store_errors_are_sanitized() {
        let err = RoomError::from(StoreError::UnknownUser(42));
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_room_id_redacted() {
        let room_id = Uuid::new_v4();
        let err = RoomError::RoomNotFound(room_id);
        assert!(!err.client_message().contains(&room_id.to_string()));
    }
}
