//! Unified error type for the server crate.

use ninetynine_engine::GameError;
use ninetynine_protocol::ProtocolError;
use ninetynine_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From`
/// impls, so the `?` operator converts lower-layer errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A game-rule error (room not found, not your turn, ...).
    #[error(transparent)]
    Game(#[from] GameError),
}
