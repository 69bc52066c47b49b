//! Room service: runs each request against a room's game under the
//! room lock and keeps the in-memory game in step with the stores.
//!
//! Every request follows the same shape. The game is mutated in memory,
//! the result is written out, and the game is committed on success or
//! rolled back to its last commit on failure. A showdown adds one step
//! in front: the payout goes to the balance ledger first, and only once
//! it's durable is the hand reset and the room state saved.

use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::{
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    manager::{RoomHandle, RoomManager},
    messages::{BetRequest, BetResponse, HandStartResponse, LeaveResponse, SeatRequest},
};
use crate::{
    db::{BalanceLedger, GameRepository, StoreError},
    game::{
        Committed, Game, GameError, Showdown,
        entities::{RoomId, Username},
    },
};

/// Run a game operation, undoing any partial change if it fails.
fn apply<T, F>(game: &mut Game, op: F) -> RoomResult<T>
where
    F: FnOnce(&mut Game) -> Result<T, GameError>,
{
    op(game).map_err(|err| {
        game.rollback();
        RoomError::Game(err)
    })
}

pub struct GameService {
    rooms: RoomManager,
    games: Arc<dyn GameRepository>,
    ledger: Arc<dyn BalanceLedger>,
    config: RoomConfig,
}

impl GameService {
    pub fn new(
        rooms: RoomManager,
        games: Arc<dyn GameRepository>,
        ledger: Arc<dyn BalanceLedger>,
        config: RoomConfig,
    ) -> Self {
        Self {
            rooms,
            games,
            ledger,
            config,
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    /// Find a room, restoring it from the state store if this process
    /// hasn't seen it yet.
    async fn room(&self, room_id: RoomId) -> RoomResult<RoomHandle> {
        if let Some(handle) = self.rooms.get(room_id).await {
            return Ok(handle);
        }
        match self.games.load(room_id).await {
            Ok(game) => {
                info!("Restored room {room_id} from the state store");
                Ok(self.rooms.insert(game).await)
            }
            Err(StoreError::NotFound(_)) => Err(RoomError::RoomNotFound(room_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Lock a room's game for the rest of a request.
    ///
    /// A room can close while a request waits on its lock. Once the lock
    /// is held the handle must still be the registered one, otherwise
    /// the room is gone.
    async fn lock(&self, room_id: RoomId) -> RoomResult<OwnedMutexGuard<Game>> {
        let handle = self.room(room_id).await?;
        let game = handle.clone().lock_owned().await;
        match self.rooms.get(room_id).await {
            Some(current) if Arc::ptr_eq(&current, &handle) => Ok(game),
            _ => Err(RoomError::RoomNotFound(room_id)),
        }
    }

    /// Save the game and commit it, or roll it back if the save fails.
    async fn persist(&self, game: &mut Game) -> RoomResult<()> {
        match self.games.save(game).await {
            Ok(()) => {
                game.commit();
                Ok(())
            }
            Err(err) => {
                error!("Failed to save room {}: {err}", game.room_id);
                game.rollback();
                warn!("Room {} rolled back to its last commit", game.room_id);
                Err(err.into())
            }
        }
    }

    /// Write a finished hand's payout to the ledger, then reset the hand
    /// and save the room.
    ///
    /// A ledger failure rolls the whole request back and is returned as
    /// an error. Once the ledger has accepted the payout the hand is
    /// over, so a failed state save afterwards is only reported through
    /// the returned message.
    async fn close_hand(&self, game: &mut Game, showdown: &Showdown) -> RoomResult<Option<String>> {
        if let Err(err) = self.ledger.update_balances(&showdown.ledger_batch()).await {
            error!("Ledger rejected payout for room {}: {err}", game.room_id);
            game.rollback();
            warn!("Room {} rolled back to its last commit", game.room_id);
            return Err(err.into());
        }
        game.reset_hand();
        game.commit();
        match self.games.save(game).await {
            Ok(()) => Ok(None),
            Err(err) => {
                error!(
                    "Payout for room {} is in the ledger but the room state wasn't saved: {err}",
                    game.room_id
                );
                Ok(Some(RoomError::from(err).client_message()))
            }
        }
    }

    /// Open a room with `host` seated.
    pub async fn create_room(&self, host: SeatRequest) -> RoomResult<RoomId> {
        if host.game_balance > host.total_balance {
            return Err(GameError::NotEnoughBalance.into());
        }
        let game = Game::new(Uuid::new_v4(), self.config.room_limit, host.into_player());
        let room_id = game.room_id;
        self.games.save(&game).await?;
        self.rooms.insert(game).await;
        info!("Created room {room_id}");
        Ok(room_id)
    }

    pub async fn join(&self, room_id: RoomId, seat: SeatRequest) -> RoomResult<()> {
        let mut game = self.lock(room_id).await?;
        apply(&mut game, |g| g.add_player(seat.into_player()))?;
        self.persist(&mut game).await
    }

    /// Leave a room. The room is closed when its last player leaves.
    pub async fn leave(&self, room_id: RoomId, name: &Username) -> RoomResult<LeaveResponse> {
        let mut game = self.lock(room_id).await?;
        let settled = apply(&mut game, |g| g.leave(name))?;

        if let Some(showdown) = settled {
            let error = self.close_hand(&mut game, &showdown).await?;
            return Ok(LeaveResponse {
                room_closed: false,
                winners: showdown.winners,
                error,
            });
        }
        if !game.players.is_empty() {
            self.persist(&mut game).await?;
            return Ok(LeaveResponse::default());
        }

        if let Err(err) = self.games.delete(room_id).await {
            error!("Failed to delete room {room_id}: {err}");
            game.rollback();
            return Err(err.into());
        }
        // Unregister while still holding the lock so queued requests
        // see the room as gone.
        self.rooms.remove(room_id).await;
        drop(game);
        info!("Closed room {room_id}");
        Ok(LeaveResponse {
            room_closed: true,
            ..LeaveResponse::default()
        })
    }

    pub async fn set_ready(
        &self,
        room_id: RoomId,
        name: &Username,
        is_ready: bool,
    ) -> RoomResult<()> {
        let mut game = self.lock(room_id).await?;
        apply(&mut game, |g| g.set_ready(name, is_ready))?;
        self.persist(&mut game).await
    }

    pub async fn start_game(&self, room_id: RoomId) -> RoomResult<HandStartResponse> {
        let mut game = self.lock(room_id).await?;
        let start = apply(&mut game, Game::start_hand)?;
        self.persist(&mut game).await?;
        Ok(start.into())
    }

    /// Apply a bet or fold. A request that finishes the hand also pays
    /// out and resets the room for the next hand.
    pub async fn bet(&self, room_id: RoomId, request: &BetRequest) -> RoomResult<BetResponse> {
        let mut game = self.lock(room_id).await?;
        let outcome = apply(&mut game, |g| g.take_bet(request))?;
        let mut response = BetResponse::from(&outcome);

        match &outcome.showdown {
            Some(showdown) => {
                response.error = self.close_hand(&mut game, showdown).await?;
            }
            None => self.persist(&mut game).await?,
        }
        Ok(response)
    }

    /// Copy of a room's current game.
    pub async fn game(&self, room_id: RoomId) -> RoomResult<Game> {
        let game = self.lock(room_id).await?;
        Ok(game.clone())
    }
}
