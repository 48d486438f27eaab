//! Per-room fan-out of game updates.
//!
//! Every connection owns an unbounded channel drained by its writer
//! task; the broadcaster holds the sending halves, grouped by room.
//! Sending never does network I/O under the topic lock — it only
//! pushes into channels, so a slow client cannot stall a broadcast.

use std::collections::HashMap;

use ninetynine_engine::{PlayerId, RoomId};
use ninetynine_protocol::GameUpdate;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;

/// Routes updates to the members of a room.
#[derive(Default)]
pub(crate) struct Broadcaster {
    topics: Mutex<HashMap<RoomId, HashMap<PlayerId, UnboundedSender<GameUpdate>>>>,
}

impl Broadcaster {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a player's outbound channel under a room topic.
    pub(crate) async fn subscribe(
        &self,
        room_id: &RoomId,
        player: PlayerId,
        sender: UnboundedSender<GameUpdate>,
    ) {
        self.topics
            .lock()
            .await
            .entry(room_id.clone())
            .or_default()
            .insert(player, sender);
    }

    /// Drops one player's subscription. Removes the topic when it
    /// empties.
    pub(crate) async fn unsubscribe(&self, room_id: &RoomId, player: &PlayerId) {
        let mut topics = self.topics.lock().await;
        if let Some(members) = topics.get_mut(room_id) {
            members.remove(player);
            if members.is_empty() {
                topics.remove(room_id);
            }
        }
    }

    /// Drops a whole topic (room destroyed).
    pub(crate) async fn drop_room(&self, room_id: &RoomId) {
        self.topics.lock().await.remove(room_id);
    }

    /// Sends an update to every subscriber of a room. Subscribers whose
    /// channel has closed are pruned on the spot.
    pub(crate) async fn send_room(&self, room_id: &RoomId, update: GameUpdate) {
        let mut topics = self.topics.lock().await;
        if let Some(members) = topics.get_mut(room_id) {
            members.retain(|player, sender| {
                let alive = sender.send(update.clone()).is_ok();
                if !alive {
                    tracing::debug!(%room_id, %player, "pruning closed subscriber");
                }
                alive
            });
        }
    }

    /// Sends an update to a single member of a room.
    pub(crate) async fn send_to(
        &self,
        room_id: &RoomId,
        player: &PlayerId,
        update: GameUpdate,
    ) {
        let topics = self.topics.lock().await;
        if let Some(sender) = topics.get(room_id).and_then(|m| m.get(player)) {
            let _ = sender.send(update);
        }
    }
}
