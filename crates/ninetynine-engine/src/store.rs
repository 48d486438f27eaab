//! Room registry: concurrency-safe maps from room ids to rooms and
//! from player ids to their current room.
//!
//! The store holds each [`Room`] behind its own `Arc<Mutex<_>>`. An
//! engine operation resolves the handle, locks the room for the
//! duration of exactly one operation, and releases it on every exit
//! path. The map locks themselves are held only long enough to clone a
//! handle or touch an index entry.
//!
//! Lock order: a map guard is never held while waiting on a room lock.
//! The reverse (taking a map guard while holding a room lock) is
//! allowed, which is what the quit-to-empty path does to remove the
//! room atomically with the last player leaving.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::{Mutex, RwLock};

use crate::{PlayerId, Room, RoomId};

/// Shared handle to a single room. Locked for one operation at a time.
pub type RoomHandle = Arc<Mutex<Room>>;

/// How many short-id collisions we tolerate before widening the id
/// space. 9 000 four-digit ids run out fast on a busy server.
const SHORT_ID_ATTEMPTS: u32 = 32;

/// Registry of all live rooms plus the player → room index.
#[derive(Default)]
pub struct RoomStore {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
    player_rooms: RwLock<HashMap<PlayerId, RoomId>>,
}

impl RoomStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh unique room id and inserts the room built by
    /// `make`. Id generation and insertion happen under one write
    /// guard, so two concurrent creates can never collide.
    pub async fn insert_new(
        &self,
        make: impl FnOnce(RoomId) -> Room,
    ) -> (RoomId, RoomHandle) {
        let mut rooms = self.rooms.write().await;
        let mut rng = rand::rng();
        let mut attempts = 0u32;
        let room_id = loop {
            // Human-friendly 4-digit ids; widen to 8 digits if the
            // short space keeps colliding.
            let candidate = if attempts < SHORT_ID_ATTEMPTS {
                RoomId(format!("{}", rng.random_range(1000..10000)))
            } else {
                RoomId(format!("{:08}", rng.random_range(0..100_000_000u32)))
            };
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            attempts += 1;
        };

        let handle: RoomHandle = Arc::new(Mutex::new(make(room_id.clone())));
        rooms.insert(room_id.clone(), Arc::clone(&handle));
        (room_id, handle)
    }

    /// Returns the handle for a room, if it is live.
    pub async fn room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Removes a room from the registry. Safe to call while holding
    /// the room's own lock (see module docs for the lock order).
    pub async fn remove(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.write().await.remove(room_id)
    }

    /// Records which room a player is in.
    pub async fn bind_player(&self, player_id: PlayerId, room_id: RoomId) {
        self.player_rooms.write().await.insert(player_id, room_id);
    }

    /// Drops a player's room binding.
    pub async fn unbind_player(&self, player_id: &PlayerId) {
        self.player_rooms.write().await.remove(player_id);
    }

    /// Returns the room a player is currently bound to, if any.
    pub async fn room_of(&self, player_id: &PlayerId) -> Option<RoomId> {
        self.player_rooms.read().await.get(player_id).cloned()
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
