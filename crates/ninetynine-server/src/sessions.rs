//! Connection → player identity registry.
//!
//! A connection earns an identity by creating or joining a room; every
//! later request on that connection is attributed to the bound player.
//! Disconnecting only removes the binding — the player object stays in
//! its room until an explicit quit or kick.

use std::collections::HashMap;

use ninetynine_engine::PlayerId;
use ninetynine_transport::ConnectionId;
use tokio::sync::Mutex;

/// Who is speaking on which connection.
#[derive(Default)]
pub(crate) struct SessionRegistry {
    bindings: Mutex<HashMap<ConnectionId, PlayerId>>,
}

impl SessionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a player, replacing any previous binding.
    pub(crate) async fn bind(&self, conn: ConnectionId, player: PlayerId) {
        self.bindings.lock().await.insert(conn, player);
    }

    /// The player bound to this connection, if any.
    pub(crate) async fn player(&self, conn: ConnectionId) -> Option<PlayerId> {
        self.bindings.lock().await.get(&conn).cloned()
    }

    /// Removes the binding, returning the player it pointed at.
    pub(crate) async fn unbind(&self, conn: ConnectionId) -> Option<PlayerId> {
        self.bindings.lock().await.remove(&conn)
    }
}
