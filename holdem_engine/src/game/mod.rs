//! Hold'em game engine: cards, hand evaluation, the betting state
//! machine, and the showdown payout.

pub mod constants;
pub mod entities;
pub mod functional;
pub mod player;
pub mod showdown;
pub mod snapshot;
pub mod state_machine;

pub use player::Player;
pub use showdown::{Payout, Showdown};
pub use snapshot::{Committed, Snapshot};
pub use state_machine::{BetOutcome, BetRequest, Game, GameError, HandStart, next_valid};
