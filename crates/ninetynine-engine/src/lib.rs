//! Room registry and game state machine for ninetynine.
//!
//! This crate is the core of the server: it knows nothing about
//! networking. The [`GameEngine`] applies every rule of the
//! guess-the-number game to rooms held in a concurrency-safe
//! [`RoomStore`]; callers (the server crate) resolve identities,
//! invoke one operation, and hand the resulting [`Room`] snapshot to
//! the broadcast layer.
//!
//! # Key types
//!
//! - [`GameEngine`] — create/join/start/guess/quit/restart/remove/decide
//! - [`RoomStore`] — room id → room, player id → room id
//! - [`Room`], [`Player`], [`Turn`] — the data model
//! - [`GameError`] — the caller-recoverable failure taxonomy

mod engine;
mod error;
mod ids;
mod model;
mod store;

pub use engine::GameEngine;
pub use error::GameError;
pub use ids::{PlayerId, RoomId};
pub use model::{
    GameState, Player, PostGameDecision, Room, Turn, RANGE_MAX, RANGE_MIN,
};
pub use store::{RoomHandle, RoomStore};
