//! Wire message types.
//!
//! Clients speak [`ClientRequest`]; the server answers and broadcasts
//! [`GameUpdate`]. Both are internally tagged JSON
//! (`#[serde(tag = "type")]`), which keeps the payloads easy to handle
//! from a browser client.
//!
//! The room embedded in an update is the engine's own [`Room`] type;
//! its `secret_number` field is `#[serde(skip)]`, so the secret can
//! never travel on the wire no matter which update carries the room.

use serde::{Deserialize, Serialize};

use ninetynine_engine::{Room, RoomId, Turn};

/// Everything a client can ask the server to do.
///
/// Requests that act on behalf of a player (`StartGame`, `Guess`,
/// `RestartGame`, `RemovePlayer`, `Decide`, `StartCountdown`) carry no
/// player id: the server resolves the caller from the connection's
/// session binding, established at `CreateRoom`/`JoinRoom` time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Open a new room with the caller as host.
    CreateRoom { player_name: String },

    /// Join an existing waiting room.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Announce the countdown and start the game when it elapses.
    /// Host-only.
    StartCountdown { room_id: RoomId },

    /// Start the game immediately. Host-only.
    StartGame { room_id: RoomId },

    /// Guess a number. Only valid for the player whose turn it is.
    Guess { room_id: RoomId, guess: i32 },

    /// Leave the room. Name-based, matching the room's member list.
    QuitGame { room_id: RoomId, player_name: String },

    /// Reset a finished game back to the lobby. Host-only.
    RestartGame { room_id: RoomId },

    /// Kick a player by name. Host-only.
    RemovePlayer { room_id: RoomId, player_name: String },

    /// Record the caller's post-game play-again choice.
    Decide { room_id: RoomId, play_again: bool },
}

/// Classification tag for a [`GameUpdate`].
///
/// Serialized SCREAMING_SNAKE_CASE ("ROOM_CREATED", "GUESS_MADE", ...)
/// to match what the web client switches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateKind {
    RoomCreated,
    PlayerJoined,
    GameStartingCountdown,
    GameStarted,
    GuessMade,
    PlayerQuit,
    GameRestarted,
    PlayerRemoved,
    PlayerKicked,
    PlayerDecided,
    AllPlayersDecided,
    Error,
}

/// One server → client notification.
///
/// Successful operations broadcast an update to every member of the
/// room; failures are delivered only to the caller, as `Error` with no
/// room attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_turn: Option<Turn>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_play_again: Option<bool>,
}

impl GameUpdate {
    /// An update carrying a room snapshot.
    pub fn with_room(kind: UpdateKind, room: Room, message: impl Into<String>) -> Self {
        Self {
            kind,
            room: Some(room),
            last_turn: None,
            message: message.into(),
            all_play_again: None,
        }
    }

    /// A guess update: room snapshot plus the turn just played.
    pub fn guess(room: Room, turn: Turn, message: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::GuessMade,
            room: Some(room),
            last_turn: Some(turn),
            message: message.into(),
            all_play_again: None,
        }
    }

    /// An error update for the originating caller only.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: UpdateKind::Error,
            room: None,
            last_turn: None,
            message: message.into(),
            all_play_again: None,
        }
    }

    /// A bare notification with no room attached (e.g. PLAYER_KICKED
    /// to the player being removed).
    pub fn notice(kind: UpdateKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            room: None,
            last_turn: None,
            message: message.into(),
            all_play_again: None,
        }
    }
}
