//! Requests and responses exchanged with the room service.

use serde::{Deserialize, Serialize};

use super::errors::RoomError;
use crate::game::{
    BetOutcome, HandStart, Player,
    entities::{Chips, Street, Username},
};

pub use crate::game::BetRequest;

/// Seat a user in a room.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatRequest {
    pub user_id: i64,
    pub name: Username,
    /// Bankroll as currently held by the ledger.
    pub total_balance: Chips,
    /// Chips brought to the table.
    pub game_balance: Chips,
}

impl SeatRequest {
    #[must_use]
    pub fn into_player(self) -> Player {
        Player::new(self.user_id, self.name, self.total_balance, self.game_balance)
    }
}

/// Reply to a bet or fold.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct BetResponse {
    /// Set when the hand was paid out but the room state couldn't be
    /// saved afterwards.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub is_round_end: bool,
    pub is_player_dead: bool,
    pub player_current_bet: Chips,
    pub player_total_bet: Chips,
    pub table_current_bet: Chips,
    pub table_total_bet: Chips,
    pub next_player_name: Option<Username>,
    pub street: Street,
    pub winners: Vec<Username>,
}

impl BetResponse {
    /// A response carrying only the error, for transports that always
    /// answer with a body.
    #[must_use]
    pub fn rejected(err: &RoomError) -> Self {
        Self {
            error: Some(err.client_message()),
            ..Self::default()
        }
    }
}

impl From<&BetOutcome> for BetResponse {
    fn from(outcome: &BetOutcome) -> Self {
        Self {
            error: None,
            is_round_end: outcome.is_round_end,
            is_player_dead: outcome.is_player_dead,
            player_current_bet: outcome.player_current_bet,
            player_total_bet: outcome.player_total_bet,
            table_current_bet: outcome.table_current_bet,
            table_total_bet: outcome.table_total_bet,
            next_player_name: outcome.next_player_name.clone(),
            street: outcome.street,
            winners: outcome
                .showdown
                .as_ref()
                .map(|showdown| showdown.winners.clone())
                .unwrap_or_default(),
        }
    }
}

/// Reply to a hand start.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandStartResponse {
    pub ready_players: Vec<Username>,
    pub first_player: Username,
    pub small_blind: Username,
    pub big_blind: Username,
}

impl From<HandStart> for HandStartResponse {
    fn from(start: HandStart) -> Self {
        Self {
            ready_players: start.ready_players,
            first_player: start.first_player,
            small_blind: start.small_blind,
            big_blind: start.big_blind,
        }
    }
}

/// Reply to a leave.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LeaveResponse {
    /// The last player left and the room was closed.
    pub room_closed: bool,
    /// Winners, if leaving ended the hand.
    pub winners: Vec<Username>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
