//! Deferred game start.
//!
//! The host announces a countdown; the room sees the announcement
//! immediately and the game starts once the delay elapses. The start
//! itself re-validates through the engine, so a room that emptied or
//! already started in the meantime makes the deferred start a no-op.

use std::sync::Arc;
use std::time::Duration;

use ninetynine_engine::{PlayerId, RoomId};
use ninetynine_protocol::{GameUpdate, UpdateKind};

use crate::server::ServerState;

/// Default delay between the countdown announcement and game start.
pub const GAME_STARTING_COUNTDOWN: Duration = Duration::from_secs(5);

/// Spawns the deferred start for a room. Fire-and-forget: failures are
/// logged, never surfaced, since the requesting connection may be long
/// gone when the timer fires.
pub(crate) fn schedule_start(
    state: Arc<ServerState>,
    room_id: RoomId,
    host: PlayerId,
) {
    tokio::spawn(async move {
        tokio::time::sleep(state.countdown_delay).await;
        match state.engine.start_game(&room_id, &host).await {
            Ok(room) => {
                let message = format!(
                    "Game started! Current range: {}-{}",
                    room.min_range, room.max_range
                );
                state
                    .broadcaster
                    .send_room(
                        &room_id,
                        GameUpdate::with_room(
                            UpdateKind::GameStarted,
                            room,
                            message,
                        ),
                    )
                    .await;
            }
            Err(e) => {
                tracing::debug!(
                    %room_id, error = %e, "deferred start aborted"
                );
            }
        }
    });
}
