//! Domain model: players, turns, rooms, and the game lifecycle.
//!
//! A [`Room`] is one game session: an ordered player list, a hidden
//! secret number, and the shared `[min_range, max_range]` window that
//! every guess narrows. Rooms are mutated exclusively by the engine,
//! one operation at a time (see the store for the locking discipline).

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomId};

/// Lower bound of the guessing range at game start.
pub const RANGE_MIN: i32 = 1;
/// Upper bound of the guessing range at game start.
pub const RANGE_MAX: i32 = 99;

// ---------------------------------------------------------------------------
// GameState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// WaitingForPlayers → InProgress → Finished
///         ↑                            │
///         └──────────(restart)─────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    /// Room exists and accepts joins; no game running yet.
    WaitingForPlayers,
    /// A game is running; exactly one player holds the turn.
    InProgress,
    /// The secret was guessed. Players may decide to play again.
    Finished,
}

impl GameState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::WaitingForPlayers)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForPlayers => write!(f, "WaitingForPlayers"),
            Self::InProgress => write!(f, "InProgress"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player's choice once a game has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostGameDecision {
    /// No choice made yet.
    #[default]
    Undecided,
    /// Wants another round.
    PlayAgain,
    /// Wants to leave.
    Quit,
}

/// One member of a room. Identity is the `id`; `name` is display-only
/// and not guaranteed unique within a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    #[serde(default)]
    pub post_game_decision: PostGameDecision,
}

impl Player {
    /// Creates a new player with no post-game decision.
    pub fn new(id: PlayerId, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_host,
            post_game_decision: PostGameDecision::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Turns
// ---------------------------------------------------------------------------

/// An immutable record of one guess and its outcome. Appended to the
/// room history and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub player_id: PlayerId,
    pub player_name: String,
    pub guess: i32,
    pub result: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One game session.
///
/// Invariants (upheld by the engine):
/// - `players` is non-empty while the room exists.
/// - `host_id` matches exactly one player, whose `is_host` is true.
/// - While `InProgress`, `current_player_index < players.len()`.
/// - `min_range <= max_range`, narrowed monotonically by guesses.
///
/// `secret_number` is `#[serde(skip)]`: a serialized room never leaks
/// the secret, only the narrowed range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub host_id: PlayerId,
    pub players: Vec<Player>,
    pub state: GameState,
    #[serde(skip)]
    pub secret_number: i32,
    pub current_player_index: usize,
    pub min_range: i32,
    pub max_range: i32,
    pub history: Vec<Turn>,
}

impl Room {
    /// Creates a fresh room containing only its host.
    pub fn new(room_id: RoomId, host_id: PlayerId, host_name: impl Into<String>) -> Self {
        let host = Player::new(host_id.clone(), host_name, true);
        Self {
            room_id,
            host_id,
            players: vec![host],
            state: GameState::WaitingForPlayers,
            secret_number: 0,
            current_player_index: 0,
            min_range: RANGE_MIN,
            max_range: RANGE_MAX,
            history: Vec::new(),
        }
    }

    /// The player whose turn it is. `None` outside `InProgress` or if
    /// the index is stale (e.g. after a mid-game quit).
    pub fn current_player(&self) -> Option<&Player> {
        if self.state != GameState::InProgress {
            return None;
        }
        self.players.get(self.current_player_index)
    }

    /// Position of the first player with the given name, in list order.
    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.name == name)
    }

    /// Looks up a member by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Returns `true` if the caller is this room's host.
    pub fn is_host(&self, caller: &PlayerId) -> bool {
        self.host_id == *caller
    }

    /// Promotes the first remaining player to host and updates
    /// `host_id`. Caller must ensure `players` is non-empty.
    pub(crate) fn promote_first_to_host(&mut self) {
        let new_host = &mut self.players[0];
        new_host.is_host = true;
        self.host_id = new_host.id.clone();
    }

    /// `true` once every player has made a post-game choice.
    pub fn all_decided(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.post_game_decision != PostGameDecision::Undecided)
    }

    /// `true` if every player chose to play again.
    pub fn all_play_again(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.post_game_decision == PostGameDecision::PlayAgain)
    }

    /// Clears all post-game decisions (new game or restart).
    pub(crate) fn reset_decisions(&mut self) {
        for p in &mut self.players {
            p.post_game_decision = PostGameDecision::default();
        }
    }
}
