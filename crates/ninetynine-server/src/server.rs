//! `GameServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → sessions → engine.
//! Each accepted connection gets its own handler task; everything they
//! share lives in [`ServerState`] behind an `Arc`.

use std::sync::Arc;
use std::time::Duration;

use ninetynine_engine::GameEngine;
use ninetynine_protocol::JsonCodec;
use ninetynine_transport::{Transport, WebSocketTransport};

use crate::broadcast::Broadcaster;
use crate::countdown::GAME_STARTING_COUNTDOWN;
use crate::handler::handle_connection;
use crate::sessions::SessionRegistry;
use crate::ServerError;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    pub(crate) engine: GameEngine,
    pub(crate) sessions: SessionRegistry,
    pub(crate) broadcaster: Broadcaster,
    pub(crate) codec: JsonCodec,
    pub(crate) countdown_delay: Duration,
}

impl ServerState {
    pub(crate) fn new(countdown_delay: Duration) -> Self {
        Self {
            engine: GameEngine::new(),
            sessions: SessionRegistry::new(),
            broadcaster: Broadcaster::new(),
            codec: JsonCodec,
            countdown_delay,
        }
    }
}

/// Builder for configuring and starting a game server.
///
/// # Example
///
/// ```rust,ignore
/// let server = GameServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct GameServerBuilder {
    bind_addr: String,
    countdown_delay: Duration,
}

impl GameServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            countdown_delay: GAME_STARTING_COUNTDOWN,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the delay between the countdown announcement and the
    /// actual game start.
    pub fn countdown_delay(mut self, delay: Duration) -> Self {
        self.countdown_delay = delay;
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<GameServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let state = Arc::new(ServerState::new(self.countdown_delay));
        Ok(GameServer { transport, state })
    }
}

impl Default for GameServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running game server. Call [`run()`](Self::run) to start accepting
/// connections.
pub struct GameServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl GameServer {
    /// Creates a new builder.
    pub fn builder() -> GameServerBuilder {
        GameServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("ninetynine server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
