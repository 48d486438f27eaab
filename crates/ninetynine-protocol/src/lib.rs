//! Wire protocol for ninetynine.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Messages** ([`ClientRequest`], [`GameUpdate`], [`UpdateKind`]) —
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   become bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between the transport (raw frames) and the
//! server (identity and dispatch). It depends on the engine's data
//! model so updates can carry [`ninetynine_engine::Room`] snapshots
//! directly; the room's secret number is excluded from serialization
//! by the model itself, so no codec can leak it.

mod codec;
mod error;
mod messages;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use messages::{ClientRequest, GameUpdate, UpdateKind};
