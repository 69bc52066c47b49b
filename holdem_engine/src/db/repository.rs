//! Persistence traits and their PostgreSQL implementations.

use async_trait::async_trait;
use log::debug;
use sqlx::{PgPool, Row};

use super::errors::{StoreError, StoreResult};
use crate::game::{
    Committed, Game,
    entities::{Chips, RoomId},
};

/// Durable home of each room's game state.
#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Load a room's game. The returned game is committed, so a rollback
    /// returns to exactly what was stored.
    async fn load(&self, room_id: RoomId) -> StoreResult<Game>;

    /// Insert or replace the room's game.
    async fn save(&self, game: &Game) -> StoreResult<()>;

    /// Forget a room. Deleting an unknown room is not an error.
    async fn delete(&self, room_id: RoomId) -> StoreResult<()>;
}

/// Bankroll storage updated once per showdown.
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Set each `(user_id, new_total_balance)`. Either every balance is
    /// written or none is.
    async fn update_balances(&self, balances: &[(i64, Chips)]) -> StoreResult<()>;
}

/// Default PostgreSQL implementation of `GameRepository`
pub struct PgGameRepository {
    pool: PgPool,
}

impl PgGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameRepository for PgGameRepository {
    async fn load(&self, room_id: RoomId) -> StoreResult<Game> {
        let row = sqlx::query("SELECT state::text AS state FROM games WHERE room_id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(room_id))?;
        let state: String = row.get("state");
        let mut game: Game = serde_json::from_str(&state)?;
        game.commit();
        Ok(game)
    }

    async fn save(&self, game: &Game) -> StoreResult<()> {
        let state = serde_json::to_string(game)?;
        sqlx::query(
            "INSERT INTO games (room_id, state, updated_at) VALUES ($1, $2::jsonb, NOW())
             ON CONFLICT (room_id) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
        )
        .bind(game.room_id)
        .bind(state)
        .execute(&self.pool)
        .await?;
        debug!("saved room {}", game.room_id);
        Ok(())
    }

    async fn delete(&self, room_id: RoomId) -> StoreResult<()> {
        sqlx::query("DELETE FROM games WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Default PostgreSQL implementation of `BalanceLedger`, backed by
/// `users.balance`.
pub struct PgBalanceLedger {
    pool: PgPool,
}

impl PgBalanceLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceLedger for PgBalanceLedger {
    async fn update_balances(&self, balances: &[(i64, Chips)]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        for &(user_id, balance) in balances {
            let balance =
                i64::try_from(balance).map_err(|_| StoreError::BalanceOutOfRange(balance))?;
            let result = sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
                .bind(balance)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            // Dropping the transaction rolls it back.
            if result.rows_affected() == 0 {
                return Err(StoreError::UnknownUser(user_id));
            }
        }
        tx.commit().await?;
        debug!("ledger updated {} balances", balances.len());
        Ok(())
    }
}
