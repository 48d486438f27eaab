//! WebSocket server for the ninetynine guessing game.
//!
//! Wires the engine to the network: the transport accepts WebSocket
//! connections, the protocol crate decodes their JSON requests, a
//! session registry attributes requests to players, and every room
//! mutation fans out to the room's members as a `GameUpdate`.
//!
//! Run it via the binary, or embed it:
//!
//! ```rust,no_run
//! use ninetynine_server::GameServer;
//!
//! # async fn run() -> Result<(), ninetynine_server::ServerError> {
//! let server = GameServer::builder().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod broadcast;
mod countdown;
mod error;
mod handler;
mod server;
mod sessions;

pub use countdown::GAME_STARTING_COUNTDOWN;
pub use error::ServerError;
pub use server::{GameServer, GameServerBuilder};
