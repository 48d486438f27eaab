//! The game engine: every state transition a room can undergo.
//!
//! Each public operation resolves a room through the [`RoomStore`],
//! holds that room's lock for the duration of the operation, and either
//! returns an updated snapshot or a [`GameError`] — all-or-nothing, no
//! partial mutation on failure. Operations on different rooms never
//! block each other.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::seq::SliceRandom;

use crate::{
    GameError, GameState, Player, PlayerId, Room, RoomId, RoomStore, Turn,
    RANGE_MAX, RANGE_MIN,
};

/// Milliseconds since the Unix epoch, for turn records.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// The engine owns the room registry and applies game rules to one
/// room at a time. Cheap to share behind an `Arc`; all interior
/// locking lives in the store.
#[derive(Default)]
pub struct GameEngine {
    store: RoomStore,
}

impl GameEngine {
    /// Creates an engine with an empty room registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new room with `host_name` as its only player and
    /// registers the host binding. Never fails.
    pub async fn create_room(&self, host_name: &str) -> Room {
        let host_id = PlayerId::generate();
        let host = host_id.clone();
        let (room_id, handle) = self
            .store
            .insert_new(|id| Room::new(id, host, host_name))
            .await;
        self.store.bind_player(host_id, room_id.clone()).await;

        let snapshot = handle.lock().await.clone();
        tracing::info!(%room_id, host = host_name, "room created");
        snapshot
    }

    /// Adds a player to a waiting room. Returns the updated room and
    /// the id issued to the new player.
    pub async fn join_room(
        &self,
        room_id: &RoomId,
        player_name: &str,
    ) -> Result<(Room, PlayerId), GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if room.players.is_empty() {
            // Lost the race against quit-to-empty destruction.
            return Err(GameError::RoomNotFound(room_id.clone()));
        }
        if !room.state.is_joinable() {
            return Err(GameError::GameAlreadyStarted(room_id.clone()));
        }

        let player_id = PlayerId::generate();
        room.players
            .push(Player::new(player_id.clone(), player_name, false));
        self.store
            .bind_player(player_id.clone(), room_id.clone())
            .await;

        tracing::info!(
            %room_id,
            player = player_name,
            players = room.players.len(),
            "player joined"
        );
        Ok((room.clone(), player_id))
    }

    /// Starts the game: shuffles the turn order (host included), draws
    /// the secret, and resets the range. Host-only; fails once the
    /// room has left `WaitingForPlayers`, so a stale countdown firing
    /// twice is harmless.
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<Room, GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if !room.is_host(caller) {
            return Err(GameError::Unauthorized(
                "only the host can start the game".into(),
            ));
        }
        if room.state != GameState::WaitingForPlayers {
            return Err(GameError::GameAlreadyStarted(room_id.clone()));
        }

        let mut rng = rand::rng();
        // Fair turn order: everyone shuffles, the host gets no
        // privileged position.
        room.players.shuffle(&mut rng);
        room.secret_number = rng.random_range(RANGE_MIN..=RANGE_MAX);
        room.min_range = RANGE_MIN;
        room.max_range = RANGE_MAX;
        room.current_player_index = 0;
        room.history.clear();
        room.reset_decisions();
        room.state = GameState::InProgress;

        tracing::info!(
            %room_id,
            players = room.players.len(),
            "game started"
        );
        Ok(room.clone())
    }

    /// Scores one guess for the player whose turn it is.
    ///
    /// Any integer is accepted — a guess outside the current range is
    /// still scored against the secret (range clamps keep narrowing
    /// monotonic). The turn record is appended unconditionally,
    /// including the losing guess.
    pub async fn make_guess(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
        guess: i32,
    ) -> Result<(Room, Turn), GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if room.players.is_empty() {
            return Err(GameError::RoomNotFound(room_id.clone()));
        }
        if room.state != GameState::InProgress {
            return Err(GameError::InvalidState(format!(
                "cannot guess while the game is {}",
                room.state
            )));
        }
        let current = room
            .players
            .get(room.current_player_index)
            .ok_or_else(|| GameError::Unauthorized("not your turn".into()))?;
        if current.id != *caller {
            return Err(GameError::Unauthorized("not your turn".into()));
        }
        let player_name = current.name.clone();

        let result = if guess == room.secret_number {
            room.state = GameState::Finished;
            format!("SECRET NUMBER GUESSED! {player_name} lost!")
        } else {
            if guess < room.secret_number {
                room.min_range = room.min_range.max(guess + 1);
            } else {
                room.max_range = room.max_range.min(guess - 1);
            }
            room.current_player_index =
                (room.current_player_index + 1) % room.players.len();
            format!("Range: {}-{}", room.min_range, room.max_range)
        };

        let turn = Turn {
            player_id: caller.clone(),
            player_name,
            guess,
            result,
            timestamp: now_millis(),
        };
        room.history.push(turn.clone());

        tracing::debug!(%room_id, player = %caller, guess, "guess made");
        Ok((room.clone(), turn))
    }

    /// Removes the first player whose name matches (list order). If the
    /// host leaves, the first remaining player is promoted; if the room
    /// empties, it is destroyed. Returns the post-removal snapshot and
    /// the id of the player who left.
    ///
    /// Turn order is deliberately left untouched — see `remove_player`
    /// for the index-adjusting variant.
    pub async fn quit_game(
        &self,
        room_id: &RoomId,
        player_name: &str,
    ) -> Result<(Room, PlayerId), GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        let position = room
            .position_by_name(player_name)
            .ok_or_else(|| GameError::PlayerNotFound(player_name.to_string()))?;

        let removed = room.players.remove(position);
        self.store.unbind_player(&removed.id).await;

        if room.players.is_empty() {
            // The room dies with its last player. Removing the map
            // entry while still holding the room lock closes the race
            // against a concurrent join.
            self.store.remove(room_id).await;
            tracing::info!(%room_id, "last player left, room destroyed");
        } else if removed.is_host {
            room.promote_first_to_host();
            tracing::info!(
                %room_id,
                new_host = %room.host_id,
                "host left, promoted next player"
            );
        }

        tracing::info!(%room_id, player = player_name, "player quit");
        Ok((room.clone(), removed.id))
    }

    /// Resets a finished game back to the lobby. Host-only. The player
    /// list is kept as-is; the next `start_game` reshuffles.
    pub async fn restart_game(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
    ) -> Result<Room, GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if !room.is_host(caller) {
            return Err(GameError::Unauthorized(
                "only the host can restart the game".into(),
            ));
        }
        if room.state != GameState::Finished {
            return Err(GameError::InvalidState(
                "restart requires a finished game".into(),
            ));
        }

        room.state = GameState::WaitingForPlayers;
        room.secret_number = 0;
        room.min_range = RANGE_MIN;
        room.max_range = RANGE_MAX;
        room.current_player_index = 0;
        room.history.clear();
        room.reset_decisions();

        tracing::info!(%room_id, "game restarted");
        Ok(room.clone())
    }

    /// Host-only kick, by name. Unlike `quit_game`, this keeps the
    /// "current player" pointer on the same logical player whenever
    /// possible: the index is decremented when the removed position was
    /// at or before it, and wraps to 0 if it would fall off the end.
    pub async fn remove_player(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
        player_name: &str,
    ) -> Result<(Room, PlayerId), GameError> {
        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if !room.is_host(caller) {
            return Err(GameError::Unauthorized(
                "only the host can remove players".into(),
            ));
        }
        let position = room
            .position_by_name(player_name)
            .ok_or_else(|| GameError::PlayerNotFound(player_name.to_string()))?;
        if room.players[position].id == room.host_id {
            return Err(GameError::SelfRemoval);
        }

        let removed = room.players.remove(position);
        self.store.unbind_player(&removed.id).await;

        if room.state == GameState::InProgress {
            if position <= room.current_player_index
                && room.current_player_index > 0
            {
                room.current_player_index -= 1;
            }
            if room.current_player_index >= room.players.len() {
                room.current_player_index = 0;
            }
        }

        tracing::info!(%room_id, player = player_name, "player removed by host");
        Ok((room.clone(), removed.id))
    }

    /// Records a post-game play-again/quit choice. Valid only while
    /// the game is `Finished`. Once the last player decides, returns
    /// `Some(true)` iff everyone chose to play again.
    pub async fn record_decision(
        &self,
        room_id: &RoomId,
        caller: &PlayerId,
        play_again: bool,
    ) -> Result<(Room, Option<bool>), GameError> {
        use crate::PostGameDecision;

        let handle = self.resolve(room_id).await?;
        let mut room = handle.lock().await;
        if room.state != GameState::Finished {
            return Err(GameError::InvalidState(
                "post-game decisions require a finished game".into(),
            ));
        }
        let player = room
            .players
            .iter_mut()
            .find(|p| p.id == *caller)
            .ok_or_else(|| {
                GameError::Unauthorized("not a member of this room".into())
            })?;
        player.post_game_decision = if play_again {
            PostGameDecision::PlayAgain
        } else {
            PostGameDecision::Quit
        };

        let verdict = room.all_decided().then(|| room.all_play_again());
        Ok((room.clone(), verdict))
    }

    /// Snapshot of a room, if it is live.
    pub async fn room(&self, room_id: &RoomId) -> Option<Room> {
        let handle = self.store.room(room_id).await?;
        let room = handle.lock().await;
        Some(room.clone())
    }

    /// The room a player is currently bound to, if any.
    pub async fn room_of(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.store.room_of(player_id).await
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.store.room_count().await
    }

    async fn resolve(
        &self,
        room_id: &RoomId,
    ) -> Result<crate::RoomHandle, GameError> {
        self.store
            .room(room_id)
            .await
            .ok_or_else(|| GameError::RoomNotFound(room_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_room_registers_host_binding() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;

        assert_eq!(room.players.len(), 1);
        assert_eq!(room.state, GameState::WaitingForPlayers);
        assert_eq!(
            engine.room_of(&room.host_id).await,
            Some(room.room_id.clone())
        );
    }

    #[tokio::test]
    async fn test_join_room_unknown_id_returns_not_found() {
        let engine = GameEngine::new();
        let err = engine
            .join_room(&RoomId::from("0000"), "Bob")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::RoomNotFound(_)));
    }

    #[tokio::test]
    async fn test_join_room_after_start_returns_already_started() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        engine.join_room(&room.room_id, "Bob").await.unwrap();
        engine.start_game(&room.room_id, &room.host_id).await.unwrap();

        let err = engine.join_room(&room.room_id, "Carol").await.unwrap_err();
        assert!(matches!(err, GameError::GameAlreadyStarted(_)));
    }

    #[tokio::test]
    async fn test_start_game_by_non_host_is_unauthorized() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let (_, bob) = engine.join_room(&room.room_id, "Bob").await.unwrap();

        let err = engine.start_game(&room.room_id, &bob).await.unwrap_err();
        assert!(matches!(err, GameError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_start_game_initializes_range_and_secret() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        engine.join_room(&room.room_id, "Bob").await.unwrap();

        let started = engine
            .start_game(&room.room_id, &room.host_id)
            .await
            .unwrap();
        assert_eq!(started.state, GameState::InProgress);
        assert_eq!(started.min_range, 1);
        assert_eq!(started.max_range, 99);
        assert_eq!(started.current_player_index, 0);
        assert!(started.history.is_empty());

        // The secret lives only inside the store, but the snapshot
        // still carries it for the engine's own evaluation.
        assert!((1..=99).contains(&started.secret_number));
    }

    #[tokio::test]
    async fn test_start_game_twice_second_call_fails_and_mutates_nothing() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        engine.join_room(&room.room_id, "Bob").await.unwrap();

        let first = engine
            .start_game(&room.room_id, &room.host_id)
            .await
            .unwrap();
        let err = engine
            .start_game(&room.room_id, &room.host_id)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::GameAlreadyStarted(_)));

        // Turn order and secret survive the failed second start.
        let after = engine.room(&room.room_id).await.unwrap();
        assert_eq!(after.secret_number, first.secret_number);
        let order: Vec<_> = after.players.iter().map(|p| &p.id).collect();
        let first_order: Vec<_> = first.players.iter().map(|p| &p.id).collect();
        assert_eq!(order, first_order);
    }

    #[tokio::test]
    async fn test_make_guess_before_start_is_invalid_state() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let err = engine
            .make_guess(&room.room_id, &room.host_id, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_make_guess_out_of_turn_is_unauthorized() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        engine.join_room(&room.room_id, "Bob").await.unwrap();
        let started = engine
            .start_game(&room.room_id, &room.host_id)
            .await
            .unwrap();

        // Whoever is NOT at index 0 guesses first.
        let waiting = &started.players[1].id;
        let err = engine
            .make_guess(&room.room_id, waiting, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Unauthorized(_)));

        // The failed guess left no trace.
        let after = engine.room(&room.room_id).await.unwrap();
        assert!(after.history.is_empty());
        assert_eq!(after.current_player_index, 0);
    }

    #[tokio::test]
    async fn test_record_decision_requires_finished_game() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let err = engine
            .record_decision(&room.room_id, &room.host_id, true)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_quit_unknown_player_returns_player_not_found() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let err = engine
            .quit_game(&room.room_id, "Nobody")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::PlayerNotFound(_)));
    }

    #[tokio::test]
    async fn test_remove_player_self_removal_rejected() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        engine.join_room(&room.room_id, "Bob").await.unwrap();

        let err = engine
            .remove_player(&room.room_id, &room.host_id, "Alice")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::SelfRemoval));
    }

    #[tokio::test]
    async fn test_remove_player_by_non_host_is_unauthorized() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let (_, bob) = engine.join_room(&room.room_id, "Bob").await.unwrap();

        let err = engine
            .remove_player(&room.room_id, &bob, "Alice")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_restart_requires_finished_state() {
        let engine = GameEngine::new();
        let room = engine.create_room("Alice").await;
        let err = engine
            .restart_game(&room.room_id, &room.host_id)
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::InvalidState(_)));
    }
}
