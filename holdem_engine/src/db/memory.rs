//! In-memory persistence for tests and local runs.
//!
//! Both stores can be switched into a failing mode to exercise the
//! rollback paths of the room service.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};
use tokio::sync::RwLock;

use super::{
    errors::{StoreError, StoreResult},
    repository::{BalanceLedger, GameRepository},
};
use crate::game::{
    Committed, Game,
    entities::{Chips, RoomId},
};

/// Games kept as JSON, the same shape the PostgreSQL store writes.
#[derive(Default)]
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<RoomId, String>>,
    failing: AtomicBool,
}

impl InMemoryGameRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn contains(&self, room_id: RoomId) -> bool {
        self.games.read().await.contains_key(&room_id)
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("game store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    async fn load(&self, room_id: RoomId) -> StoreResult<Game> {
        let games = self.games.read().await;
        let state = games.get(&room_id).ok_or(StoreError::NotFound(room_id))?;
        let mut game: Game = serde_json::from_str(state)?;
        game.commit();
        Ok(game)
    }

    async fn save(&self, game: &Game) -> StoreResult<()> {
        self.check()?;
        let state = serde_json::to_string(game)?;
        self.games.write().await.insert(game.room_id, state);
        Ok(())
    }

    async fn delete(&self, room_id: RoomId) -> StoreResult<()> {
        self.check()?;
        self.games.write().await.remove(&room_id);
        Ok(())
    }
}

/// Bankrolls keyed by user id.
#[derive(Default)]
pub struct InMemoryBalanceLedger {
    balances: RwLock<HashMap<i64, Chips>>,
    failing: AtomicBool,
}

impl InMemoryBalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account, replacing any previous balance.
    pub async fn open_account(&self, user_id: i64, balance: Chips) {
        self.balances.write().await.insert(user_id, balance);
    }

    pub async fn balance(&self, user_id: i64) -> Option<Chips> {
        self.balances.read().await.get(&user_id).copied()
    }

    /// Make every following batch fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BalanceLedger for InMemoryBalanceLedger {
    async fn update_balances(&self, balances: &[(i64, Chips)]) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("ledger offline".to_string()));
        }
        let mut accounts = self.balances.write().await;
        // Check the whole batch before touching anything.
        if let Some(&(user_id, _)) = balances
            .iter()
            .find(|(user_id, _)| !accounts.contains_key(user_id))
        {
            return Err(StoreError::UnknownUser(user_id));
        }
        for &(user_id, balance) in balances {
            accounts.insert(user_id, balance);
        }
        Ok(())
    }
}
