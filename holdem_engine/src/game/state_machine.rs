//! Per-room betting state machine.
//!
//! A [`Game`] owns the seated players in turn order and drives a hand
//! through `FreeFlop -> Flop -> Turn -> River -> showdown`. Every
//! operation validates before it mutates, so a rejected request leaves
//! the game untouched. Changes that are later lost by the durable store
//! are undone through the game's memento (see [`Committed`]).

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    constants::{HOLE_CARDS, MAX_PLAYERS},
    entities::{BetAction, Card, Chips, Deck, RoomId, Street, Username},
    player::Player,
    showdown::{self, Showdown},
    snapshot::{Committed, Snapshot},
};

/// Errors raised by game rules. Messages are shown to clients as-is.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("invalid player's turn")]
    InvalidTurn,
    #[error("player is dead")]
    PlayerDead,
    #[error("player is not ready")]
    PlayerNotReady,
    #[error("player left the game")]
    PlayerLeft,
    #[error("no player exists")]
    NoPlayerExists,
    #[error("all players left or dead or not ready")]
    NoPlayersLeft,
    #[error("betting amount is more than player's balance")]
    OverBalance,
    #[error("player's betting is lower than current betting amount")]
    LowBetting,
    #[error("players should be equal or more than two")]
    LackOfPlayers,
    #[error("equal or more than two players should be ready")]
    NotEnoughPlayersReady,
    #[error("game is already started you can't change ready status")]
    GameAlreadyStarted,
    #[error("game is not started")]
    GameNotStarted,
    #[error("player is already in the gameroom")]
    PlayerAlreadyExists,
    #[error("max number of player is {0}")]
    RoomFull(usize),
    #[error("game balance must be equal or lower than user's balance")]
    NotEnoughBalance,
    #[error("hand evaluation needs 7 cards, got {0}")]
    InvalidCardCount(usize),
    #[error("balance update out of range")]
    BalanceOverflow,
}

/// Index of the next valid player after `from`, walking the seats
/// circularly. `None` once the walk gets back to `from`.
#[must_use]
pub fn next_valid(players: &[Player], from: usize) -> Option<usize> {
    let n = players.len();
    (1..n)
        .map(|step| (from + step) % n)
        .find(|&idx| players[idx].is_valid())
}

/// Index of the first ready player at or after `from`.
#[must_use]
pub fn next_ready(players: &[Player], from: usize) -> Option<usize> {
    let n = players.len();
    (0..n)
        .map(|step| (from + step) % n)
        .find(|&idx| players[idx].is_ready)
}

fn valid_at_or_after(players: &[Player], from: usize) -> Option<usize> {
    let n = players.len();
    (0..n)
        .map(|step| (from + step) % n)
        .find(|&idx| players[idx].is_valid())
}

/// Position of a seat once the seats flagged in `removed` are gone. A
/// removed seat maps to the closest kept seat before it, so rotating
/// forward from the result reaches the seat that would have come next.
fn reanchor(old: usize, removed: &[bool]) -> usize {
    let remaining = removed.iter().filter(|&&gone| !gone).count();
    if remaining == 0 {
        return 0;
    }
    let kept_before = removed[..old.min(removed.len())]
        .iter()
        .filter(|&&gone| !gone)
        .count();
    if removed.get(old).copied().unwrap_or(true) {
        (kept_before + remaining - 1) % remaining
    } else {
        kept_before
    }
}

/// A single bet or fold request.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BetRequest {
    pub player_name: Username,
    pub bet_amount: Chips,
    pub is_fold: bool,
}

/// Result of an accepted bet or fold.
#[derive(Clone, Debug, PartialEq)]
pub struct BetOutcome {
    pub is_round_end: bool,
    pub is_player_dead: bool,
    pub player_current_bet: Chips,
    pub player_total_bet: Chips,
    pub table_current_bet: Chips,
    pub table_total_bet: Chips,
    /// `None` once the hand is over.
    pub next_player_name: Option<Username>,
    pub street: Street,
    /// Set when the request finished the hand. The payout is already
    /// applied to the players but not yet written to the ledger.
    pub showdown: Option<Showdown>,
}

/// Seats and blinds for a freshly started hand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HandStart {
    pub ready_players: Vec<Username>,
    pub first_player: Username,
    pub small_blind: Username,
    pub big_blind: Username,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Game {
    pub room_id: RoomId,
    pub room_limit: usize,
    pub host_name: Username,
    /// Seating order, which is also turn order.
    pub players: Vec<Player>,
    deck: Deck,
    pub board: Vec<Card>,
    pub street: Street,
    pub small_blind_idx: usize,
    pub big_blind_idx: usize,
    pub first_player_idx: usize,
    pub current_player_idx: usize,
    pub bet_leader_idx: usize,
    /// Amount to match on the current street.
    pub current_bet: Chips,
    /// Everything bet during the hand.
    pub total_bet: Chips,
    pub is_started: bool,
    /// Completed hands. Blinds are seated fresh while this is zero.
    pub hand_count: u64,
    #[serde(skip)]
    memento: GameMemento,
}

/// Committed copy of everything in a [`Game`] that changes during play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameMemento {
    host_name: Username,
    players: Vec<Player>,
    deck: Deck,
    board: Vec<Card>,
    street: Street,
    small_blind_idx: usize,
    big_blind_idx: usize,
    first_player_idx: usize,
    current_player_idx: usize,
    bet_leader_idx: usize,
    current_bet: Chips,
    total_bet: Chips,
    is_started: bool,
    hand_count: u64,
}

impl Game {
    /// Open a room with its host seated. The limit is capped at
    /// [`MAX_PLAYERS`].
    #[must_use]
    pub fn new(room_id: RoomId, room_limit: usize, host: Player) -> Self {
        let mut game = Self {
            room_id,
            room_limit: room_limit.clamp(2, MAX_PLAYERS),
            host_name: host.name.clone(),
            players: vec![host],
            deck: Deck::new(),
            board: Vec::with_capacity(5),
            street: Street::FreeFlop,
            small_blind_idx: 0,
            big_blind_idx: 0,
            first_player_idx: 0,
            current_player_idx: 0,
            bet_leader_idx: 0,
            current_bet: 0,
            total_bet: 0,
            is_started: false,
            hand_count: 0,
            memento: GameMemento::default(),
        };
        game.commit();
        game
    }

    fn player_idx(&self, name: &Username) -> Result<usize, GameError> {
        self.players
            .iter()
            .position(|p| &p.name == name)
            .ok_or(GameError::NoPlayerExists)
    }

    #[must_use]
    pub fn player(&self, name: &Username) -> Option<&Player> {
        self.players.iter().find(|p| &p.name == name)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_idx)
    }

    #[must_use]
    pub fn num_valid(&self) -> usize {
        self.players.iter().filter(|p| p.is_valid()).count()
    }

    #[must_use]
    pub fn num_ready(&self) -> usize {
        self.players.iter().filter(|p| p.is_ready).count()
    }

    /// Seat a new player at the end of the turn order.
    pub fn add_player(&mut self, player: Player) -> Result<(), GameError> {
        if self.player(&player.name).is_some() {
            return Err(GameError::PlayerAlreadyExists);
        }
        if self.players.len() >= self.room_limit {
            return Err(GameError::RoomFull(self.room_limit));
        }
        if player.game_balance > player.total_balance {
            return Err(GameError::NotEnoughBalance);
        }
        info!("{} joined room {}", player.name, self.room_id);
        self.players.push(player);
        Ok(())
    }

    /// Take a player out of the room.
    ///
    /// Between hands the seat is removed at once. During a hand the
    /// player is only flagged as left; the seat goes away when the hand
    /// is reset. If that leaves a single player in the hand, the hand is
    /// settled and the result returned.
    pub fn leave(&mut self, name: &Username) -> Result<Option<Showdown>, GameError> {
        let idx = self.player_idx(name)?;
        if !self.is_started {
            let mut removed = vec![false; self.players.len()];
            removed[idx] = true;
            self.remove_seats(&removed);
            info!("{name} left room {}", self.room_id);
            return Ok(None);
        }
        if self.players[idx].is_left {
            return Err(GameError::PlayerLeft);
        }
        let was_valid = self.players[idx].is_valid();
        self.players[idx].is_left = true;
        info!("{name} left room {} mid-hand", self.room_id);
        if was_valid {
            self.drop_out(idx)
        } else {
            Ok(None)
        }
    }

    pub fn set_ready(&mut self, name: &Username, is_ready: bool) -> Result<(), GameError> {
        let idx = self.player_idx(name)?;
        if self.is_started {
            return Err(GameError::GameAlreadyStarted);
        }
        self.players[idx].is_ready = is_ready;
        Ok(())
    }

    /// Seat the blinds, deal hole cards, and open the first street.
    pub fn start_hand(&mut self) -> Result<HandStart, GameError> {
        if self.is_started {
            return Err(GameError::GameAlreadyStarted);
        }
        if self.players.len() < 2 {
            return Err(GameError::LackOfPlayers);
        }
        if self.num_ready() < 2 {
            return Err(GameError::NotEnoughPlayersReady);
        }

        let heads_up = self.num_ready() == 2;
        let small_blind = if self.hand_count == 0 {
            next_ready(&self.players, 0)
        } else {
            next_ready(&self.players, self.small_blind_idx + 1)
        }
        .ok_or(GameError::NotEnoughPlayersReady)?;
        let big_blind = next_ready(&self.players, small_blind + 1)
            .ok_or(GameError::NotEnoughPlayersReady)?;
        let first_player = if heads_up {
            small_blind
        } else {
            next_ready(&self.players, big_blind + 1).ok_or(GameError::NotEnoughPlayersReady)?
        };

        self.small_blind_idx = small_blind;
        self.big_blind_idx = big_blind;
        self.first_player_idx = first_player;
        self.current_player_idx = first_player;
        self.bet_leader_idx = first_player;
        self.current_bet = 0;
        self.total_bet = 0;
        self.street = Street::FreeFlop;
        self.board.clear();

        for player in &mut self.players {
            player.reset();
        }
        for idx in 0..self.players.len() {
            if self.players[idx].is_ready {
                for _ in 0..HOLE_CARDS {
                    let card = self.deck.draw();
                    self.players[idx].hole_cards.push(card);
                }
            }
        }
        self.is_started = true;

        let ready_players = self
            .players
            .iter()
            .filter(|p| p.is_ready)
            .map(|p| p.name.clone())
            .collect();
        info!(
            "room {} hand #{} started: sb {}, bb {}, first {}",
            self.room_id,
            self.hand_count + 1,
            self.players[small_blind].name,
            self.players[big_blind].name,
            self.players[first_player].name,
        );
        Ok(HandStart {
            ready_players,
            first_player: self.players[first_player].name.clone(),
            small_blind: self.players[small_blind].name.clone(),
            big_blind: self.players[big_blind].name.clone(),
        })
    }

    /// Classify a bet of `amount` more chips from the player at `idx`.
    pub fn validate_bet(&self, idx: usize, amount: Chips) -> Result<BetAction, GameError> {
        let player = &self.players[idx];
        let committed = player
            .total_bet
            .checked_add(amount)
            .ok_or(GameError::OverBalance)?;
        if player.game_balance == committed {
            return Ok(BetAction::AllIn);
        }
        if player.game_balance < committed {
            return Err(GameError::OverBalance);
        }
        let street_bet = player.current_bet + amount;
        if street_bet < self.current_bet {
            return Err(GameError::LowBetting);
        }
        if street_bet > self.current_bet {
            Ok(BetAction::Raise)
        } else {
            Ok(BetAction::Check)
        }
    }

    /// Apply a bet or fold from the player whose turn it is.
    pub fn take_bet(&mut self, request: &BetRequest) -> Result<BetOutcome, GameError> {
        if !self.is_started {
            return Err(GameError::GameNotStarted);
        }
        let idx = self.player_idx(&request.player_name)?;
        if idx != self.current_player_idx {
            return Err(GameError::InvalidTurn);
        }
        let player = &self.players[idx];
        if !player.is_ready {
            return Err(GameError::PlayerNotReady);
        }
        if player.is_dead {
            return Err(GameError::PlayerDead);
        }
        if player.is_left {
            return Err(GameError::PlayerLeft);
        }

        if request.is_fold {
            self.players[idx].is_dead = true;
            debug!("{} folds", request.player_name);
            let showdown = self.drop_out(idx)?;
            return Ok(self.outcome(idx, showdown.is_some(), showdown));
        }

        let action = self.validate_bet(idx, request.bet_amount)?;
        let next = next_valid(&self.players, idx).ok_or(GameError::NoPlayersLeft)?;

        let player = &mut self.players[idx];
        if action == BetAction::AllIn {
            player.is_all_in = true;
        }
        player.current_bet += request.bet_amount;
        player.total_bet += request.bet_amount;
        self.total_bet += request.bet_amount;
        let street_bet = player.current_bet;
        debug!(
            "{} {action} ${} (street ${street_bet})",
            request.player_name, request.bet_amount
        );

        // An all-in can still raise the table.
        if street_bet > self.current_bet {
            self.current_bet = street_bet;
            self.bet_leader_idx = idx;
            self.current_player_idx = next;
            return Ok(self.outcome(idx, false, None));
        }
        if next == self.bet_leader_idx {
            let showdown = self.end_round()?;
            return Ok(self.outcome(idx, true, showdown));
        }
        self.current_player_idx = next;
        Ok(self.outcome(idx, false, None))
    }

    /// Hand the turn and bet leadership on after the player at `idx`
    /// stopped being valid. A single remaining player wins uncontested.
    fn drop_out(&mut self, idx: usize) -> Result<Option<Showdown>, GameError> {
        if self.num_valid() == 1 {
            return self.settle().map(Some);
        }
        let next = next_valid(&self.players, idx).ok_or(GameError::NoPlayersLeft)?;
        if self.bet_leader_idx == idx {
            self.bet_leader_idx = next;
        }
        if self.current_player_idx == idx {
            self.current_player_idx = next;
        }
        Ok(None)
    }

    /// Close the current betting round and move to the next street,
    /// settling the hand after the river.
    fn end_round(&mut self) -> Result<Option<Showdown>, GameError> {
        for player in &mut self.players {
            player.current_bet = 0;
        }
        self.current_bet = 0;
        self.street = self.street.next();
        if self.street == Street::Showdown {
            return self.settle().map(Some);
        }
        for _ in 0..self.street.cards_to_deal() {
            let card = self.deck.draw();
            self.board.push(card);
        }
        let first = valid_at_or_after(&self.players, self.first_player_idx)
            .ok_or(GameError::NoPlayersLeft)?;
        self.current_player_idx = first;
        self.bet_leader_idx = first;
        info!("room {} moves to {}", self.room_id, self.street);
        Ok(None)
    }

    /// Evaluate hands, pick winners, and apply the payout to every
    /// player involved.
    fn settle(&mut self) -> Result<Showdown, GameError> {
        self.street = Street::Showdown;
        let contested = self.num_valid() > 1;
        if contested {
            showdown::evaluate_hands(&mut self.players, &self.board)?;
        }
        let result = showdown::settle(&mut self.players)?;
        info!(
            "room {} showdown ({}): winners {:?}",
            self.room_id,
            if contested { "contested" } else { "uncontested" },
            result.winners,
        );
        Ok(result)
    }

    fn outcome(&self, idx: usize, is_round_end: bool, showdown: Option<Showdown>) -> BetOutcome {
        let player = &self.players[idx];
        let next_player_name = match showdown {
            Some(_) => None,
            None => self.current_player().map(|p| p.name.clone()),
        };
        BetOutcome {
            is_round_end,
            is_player_dead: player.is_dead,
            player_current_bet: player.current_bet,
            player_total_bet: player.total_bet,
            table_current_bet: self.current_bet,
            table_total_bet: self.total_bet,
            next_player_name,
            street: self.street,
            showdown,
        }
    }

    /// Get the room ready for the next hand: drop players who left,
    /// clear bets and cards, and reshuffle.
    pub fn reset_hand(&mut self) {
        let removed: Vec<bool> = self.players.iter().map(|p| p.is_left).collect();
        self.remove_seats(&removed);
        for player in &mut self.players {
            player.reset();
            if player.game_balance == 0 {
                player.is_ready = false;
            }
        }
        self.deck = Deck::new();
        self.board.clear();
        self.street = Street::FreeFlop;
        self.current_bet = 0;
        self.total_bet = 0;
        self.is_started = false;
        self.hand_count += 1;
        info!("room {} reset after hand #{}", self.room_id, self.hand_count);
    }

    fn remove_seats(&mut self, removed: &[bool]) {
        if !removed.iter().any(|&gone| gone) {
            return;
        }
        self.small_blind_idx = reanchor(self.small_blind_idx, removed);
        self.big_blind_idx = reanchor(self.big_blind_idx, removed);
        self.first_player_idx = reanchor(self.first_player_idx, removed);
        self.current_player_idx = reanchor(self.current_player_idx, removed);
        self.bet_leader_idx = reanchor(self.bet_leader_idx, removed);
        let mut flags = removed.iter();
        self.players
            .retain(|_| !flags.next().copied().unwrap_or(false));
        if self.player(&self.host_name).is_none() {
            if let Some(next_host) = self.players.first() {
                self.host_name = next_host.name.clone();
                info!("{} is now host of room {}", self.host_name, self.room_id);
            }
        }
    }
}

impl Snapshot for Game {
    type Memento = GameMemento;

    fn capture(&self) -> GameMemento {
        GameMemento {
            host_name: self.host_name.clone(),
            players: self.players.clone(),
            deck: self.deck.clone(),
            board: self.board.clone(),
            street: self.street,
            small_blind_idx: self.small_blind_idx,
            big_blind_idx: self.big_blind_idx,
            first_player_idx: self.first_player_idx,
            current_player_idx: self.current_player_idx,
            bet_leader_idx: self.bet_leader_idx,
            current_bet: self.current_bet,
            total_bet: self.total_bet,
            is_started: self.is_started,
            hand_count: self.hand_count,
        }
    }

    fn restore(&mut self, memento: &GameMemento) {
        self.host_name.clone_from(&memento.host_name);
        self.players.clone_from(&memento.players);
        self.deck.clone_from(&memento.deck);
        self.board.clone_from(&memento.board);
        self.street = memento.street;
        self.small_blind_idx = memento.small_blind_idx;
        self.big_blind_idx = memento.big_blind_idx;
        self.first_player_idx = memento.first_player_idx;
        self.current_player_idx = memento.current_player_idx;
        self.bet_leader_idx = memento.bet_leader_idx;
        self.current_bet = memento.current_bet;
        self.total_bet = memento.total_bet;
        self.is_started = memento.is_started;
        self.hand_count = memento.hand_count;
    }
}

impl Committed for Game {
    fn memento(&self) -> &GameMemento {
        &self.memento
    }

    fn memento_mut(&mut self) -> &mut GameMemento {
        &mut self.memento
    }

    /// Commit every seated player, then the game itself.
    fn commit(&mut self) {
        for player in &mut self.players {
            player.commit();
        }
        self.memento = self.capture();
    }
}
