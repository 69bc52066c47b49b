//! # Hold'em Engine
//!
//! Server-side engine for multiplayer Texas Hold'em rooms.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, seven-card hand evaluation, the per-room betting
//!   state machine, and the layered side-pot payout
//! - [`db`]: the state store and balance ledger seams with PostgreSQL
//!   and in-memory implementations
//! - [`room`]: the room registry and the service that serializes
//!   requests per room and rolls back on failed writes
//!
//! ## Example
//!
//! ```
//! use holdem_engine::functional::eval;
//! use holdem_engine::entities::{Card, Rank, Suit};
//!
//! let cards = [
//!     Card(10, Suit::Spade),
//!     Card(11, Suit::Spade),
//!     Card(12, Suit::Spade),
//!     Card(13, Suit::Spade),
//!     Card(14, Suit::Spade),
//!     Card(2, Suit::Heart),
//!     Card(7, Suit::Club),
//! ];
//! let best = eval(&cards).unwrap();
//! assert_eq!(best.rank, Rank::RoyalStraightFlush);
//! ```

/// Engine configuration loaded from the environment.
pub mod config;

/// Persistence traits and implementations.
pub mod db;

/// Core game logic, entities, and state machine.
pub mod game;
pub use game::{
    BetOutcome, BetRequest, Committed, Game, GameError, Player, Showdown, Snapshot,
    constants::{self, MAX_PLAYERS},
    entities, functional,
};

/// Room registry and request service.
pub mod room;
pub use room::{GameService, RoomError, RoomManager};
