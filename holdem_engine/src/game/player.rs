use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{BestHand, Card, Chips, Username},
    snapshot::{Committed, Snapshot},
};

/// A seated player. Seating order in the game's player list is the turn
/// order, so players are never reordered while seated.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Player {
    /// Id of the backing user account in the balance ledger.
    pub id: i64,
    pub name: Username,
    pub is_ready: bool,
    /// Folded this hand.
    pub is_dead: bool,
    /// Left mid-hand. The seat is kept until the hand is over so the
    /// indices of everyone else stay put.
    pub is_left: bool,
    pub is_all_in: bool,
    /// Bankroll held by the balance ledger.
    pub total_balance: Chips,
    /// Chips brought to the table.
    pub game_balance: Chips,
    /// Amount put in during the current street.
    pub current_bet: Chips,
    /// Amount put in during the whole hand.
    pub total_bet: Chips,
    pub hole_cards: Vec<Card>,
    /// Only set at showdown.
    pub best_hand: Option<BestHand>,
    #[serde(skip)]
    memento: PlayerMemento,
}

/// Committed copy of a player's visible fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayerMemento {
    is_ready: bool,
    is_dead: bool,
    is_left: bool,
    is_all_in: bool,
    total_balance: Chips,
    game_balance: Chips,
    current_bet: Chips,
    total_bet: Chips,
    hole_cards: Vec<Card>,
    best_hand: Option<BestHand>,
}

impl Player {
    #[must_use]
    pub fn new(id: i64, name: Username, total_balance: Chips, game_balance: Chips) -> Self {
        let mut player = Self {
            id,
            name,
            is_ready: false,
            is_dead: false,
            is_left: false,
            is_all_in: false,
            total_balance,
            game_balance,
            current_bet: 0,
            total_bet: 0,
            hole_cards: Vec::with_capacity(2),
            best_hand: None,
            memento: PlayerMemento::default(),
        };
        player.commit();
        player
    }

    /// Ready, still in the hand, and still at the table.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_ready && !self.is_dead && !self.is_left
    }

    /// Clear everything tied to the last hand.
    pub fn reset(&mut self) {
        self.is_dead = false;
        self.is_all_in = false;
        self.current_bet = 0;
        self.total_bet = 0;
        self.hole_cards.clear();
        self.best_hand = None;
    }

    /// Apply a showdown result to both the table stack and the bankroll.
    /// Returns `None` if either balance would go negative or overflow.
    #[must_use]
    pub fn apply_delta(&mut self, delta: i64) -> Option<()> {
        let game_balance = self.game_balance.checked_add_signed(delta)?;
        let total_balance = self.total_balance.checked_add_signed(delta)?;
        self.game_balance = game_balance;
        self.total_balance = total_balance;
        Some(())
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_left {
            "left"
        } else if self.is_dead {
            "folded"
        } else if self.is_all_in {
            "all-in"
        } else if self.is_ready {
            "ready"
        } else {
            "waiting"
        };
        write!(f, "{} (${}, {state})", self.name, self.game_balance)
    }
}

impl Snapshot for Player {
    type Memento = PlayerMemento;

    fn capture(&self) -> PlayerMemento {
        PlayerMemento {
            is_ready: self.is_ready,
            is_dead: self.is_dead,
            is_left: self.is_left,
            is_all_in: self.is_all_in,
            total_balance: self.total_balance,
            game_balance: self.game_balance,
            current_bet: self.current_bet,
            total_bet: self.total_bet,
            hole_cards: self.hole_cards.clone(),
            best_hand: self.best_hand.clone(),
        }
    }

    fn restore(&mut self, memento: &PlayerMemento) {
        self.is_ready = memento.is_ready;
        self.is_dead = memento.is_dead;
        self.is_left = memento.is_left;
        self.is_all_in = memento.is_all_in;
        self.total_balance = memento.total_balance;
        self.game_balance = memento.game_balance;
        self.current_bet = memento.current_bet;
        self.total_bet = memento.total_bet;
        self.hole_cards.clone_from(&memento.hole_cards);
        self.best_hand.clone_from(&memento.best_hand);
    }
}

impl Committed for Player {
    fn memento(&self) -> &PlayerMemento {
        &self.memento
    }

    fn memento_mut(&mut self) -> &mut PlayerMemento {
        &mut self.memento
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn player() -> Player {
        Player::new(1, Username::new("alice"), 10_000, 1_000)
    }

    #[test]
    fn test_player_new() {
        let player = player();
        assert!(!player.is_ready);
        assert!(!player.is_valid());
        assert_eq!(player.current_bet, 0);
        assert!(player.hole_cards.is_empty());
        assert!(player.best_hand.is_none());
    }

    #[test]
    fn test_player_validity() {
        let mut player = player();
        player.is_ready = true;
        assert!(player.is_valid());
        player.is_dead = true;
        assert!(!player.is_valid());
        player.is_dead = false;
        player.is_left = true;
        assert!(!player.is_valid());
    }

    #[test]
    fn test_player_reset_keeps_balances_and_ready() {
        let mut player = player();
        player.is_ready = true;
        player.is_dead = true;
        player.is_all_in = true;
        player.current_bet = 50;
        player.total_bet = 200;
        player.hole_cards = vec![Card(14, Suit::Spade), Card(13, Suit::Heart)];

        player.reset();

        assert!(player.is_ready);
        assert!(!player.is_dead);
        assert!(!player.is_all_in);
        assert_eq!(player.total_bet, 0);
        assert!(player.hole_cards.is_empty());
        assert_eq!(player.game_balance, 1_000);
    }

    #[test]
    fn test_apply_delta_moves_both_balances() {
        let mut player = player();
        player.apply_delta(-300).unwrap();
        assert_eq!(player.game_balance, 700);
        assert_eq!(player.total_balance, 9_700);
        player.apply_delta(500).unwrap();
        assert_eq!(player.game_balance, 1_200);
        assert_eq!(player.total_balance, 10_200);
    }

    #[test]
    fn test_apply_delta_rejects_negative_balance() {
        let mut player = player();
        assert!(player.apply_delta(-1_001).is_none());
        assert_eq!(player.game_balance, 1_000);
        assert_eq!(player.total_balance, 10_000);
    }

    // === Memento Tests ===

    #[test]
    fn test_rollback_restores_balances() {
        let mut player = player();
        player.apply_delta(-400).unwrap();
        player.is_dead = true;
        player.rollback();
        assert_eq!(player.game_balance, 1_000);
        assert_eq!(player.total_balance, 10_000);
        assert!(!player.is_dead);
    }

    #[test]
    fn test_commit_moves_rollback_point() {
        let mut player = player();
        player.apply_delta(250).unwrap();
        player.commit();
        player.apply_delta(-100).unwrap();
        player.rollback();
        assert_eq!(player.game_balance, 1_250);
    }

    #[test]
    fn test_memento_survives_clone() {
        let mut player = player();
        player.total_bet = 40;
        let mut copy = player.clone();
        copy.rollback();
        assert_eq!(copy.total_bet, 0);
    }
}
