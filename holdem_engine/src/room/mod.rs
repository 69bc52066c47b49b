//! Room layer: the registry of open rooms and the service that runs
//! requests against them.
//!
//! Each room's [`Game`](crate::game::Game) sits behind its own async
//! mutex. A request holds that lock from validation through the final
//! store write, so requests for one room never interleave while
//! different rooms proceed independently.

pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod service;

pub use config::RoomConfig;
pub use errors::{RoomError, RoomResult};
pub use manager::{RoomHandle, RoomManager, RoomMetadata};
pub use messages::{BetRequest, BetResponse, HandStartResponse, LeaveResponse, SeatRequest};
pub use service::GameService;
