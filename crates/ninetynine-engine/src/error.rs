//! Error taxonomy for engine operations.
//!
//! Every variant is a caller-recoverable domain-validation failure. A
//! failed operation never mutates room state; the caller reports the
//! error to the originating client and nobody else sees it.

use crate::RoomId;

/// Errors produced by [`GameEngine`](crate::GameEngine) operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No live room with this id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room is past `WaitingForPlayers` — too late to join or
    /// start again.
    #[error("game in room {0} has already started")]
    GameAlreadyStarted(RoomId),

    /// The operation requires a different lifecycle state.
    #[error("invalid game state: {0}")]
    InvalidState(String),

    /// The caller is not the host, or it is not their turn.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No player with the given name in this room.
    #[error("player {0} not found in room")]
    PlayerNotFound(String),

    /// The host tried to kick themselves.
    #[error("host cannot remove themselves")]
    SelfRemoval,
}
