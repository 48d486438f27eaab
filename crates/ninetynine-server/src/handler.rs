//! Per-connection handler: request decoding, dispatch, fan-out.
//!
//! Each accepted connection runs this handler in its own task, plus a
//! writer task that drains the connection's update channel. The reader
//! half decodes [`ClientRequest`]s and drives the engine; successful
//! operations broadcast to the room, failures go back to the caller
//! alone as an `ERROR` update.

use std::sync::Arc;

use ninetynine_engine::{GameError, GameState, PlayerId};
use ninetynine_protocol::{ClientRequest, Codec, GameUpdate, UpdateKind};
use ninetynine_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::countdown::schedule_start;
use crate::server::ServerState;
use crate::ServerError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let conn = Arc::new(conn);
    let (tx, mut rx) = mpsc::unbounded_channel::<GameUpdate>();

    // Writer task: the only place this connection is written to. The
    // reader below can sit in `recv` while broadcasts flow through
    // here.
    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(update) = rx.recv().await {
                let bytes = match codec.encode(&update) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode update");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        })
    };

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "undecodable request");
                let _ = tx.send(GameUpdate::error(format!(
                    "invalid request: {e}"
                )));
                continue;
            }
        };

        if let Err(e) = dispatch(&state, conn_id, &tx, request).await {
            let _ = tx.send(GameUpdate::error(e.to_string()));
        }
    }

    // Disconnect unbinds the identity and stops deliveries, but the
    // player object stays in its room until an explicit quit or kick.
    if let Some(player_id) = state.sessions.unbind(conn_id).await {
        if let Some(room_id) = state.engine.room_of(&player_id).await {
            state.broadcaster.unsubscribe(&room_id, &player_id).await;
        }
        tracing::info!(%conn_id, %player_id, "session unbound");
    }
    writer.abort();
    Ok(())
}

/// Routes one decoded request into the engine and fans out the result.
async fn dispatch(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    tx: &UnboundedSender<GameUpdate>,
    request: ClientRequest,
) -> Result<(), GameError> {
    match request {
        ClientRequest::CreateRoom { player_name } => {
            let room = state.engine.create_room(&player_name).await;
            let room_id = room.room_id.clone();
            let host_id = room.host_id.clone();
            state.sessions.bind(conn_id, host_id.clone()).await;
            state
                .broadcaster
                .subscribe(&room_id, host_id, tx.clone())
                .await;
            let message = format!("Room {room_id} created");
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(UpdateKind::RoomCreated, room, message),
                )
                .await;
        }

        ClientRequest::JoinRoom {
            room_id,
            player_name,
        } => {
            let (room, player_id) =
                state.engine.join_room(&room_id, &player_name).await?;
            state.sessions.bind(conn_id, player_id.clone()).await;
            state
                .broadcaster
                .subscribe(&room_id, player_id, tx.clone())
                .await;
            let message = format!("{player_name} joined the game");
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(UpdateKind::PlayerJoined, room, message),
                )
                .await;
        }

        ClientRequest::StartCountdown { room_id } => {
            let caller = caller(state, conn_id).await?;
            let room = state
                .engine
                .room(&room_id)
                .await
                .ok_or_else(|| GameError::RoomNotFound(room_id.clone()))?;
            if !room.is_host(&caller) {
                return Err(GameError::Unauthorized(
                    "only the host can start the game".into(),
                ));
            }
            if room.state != GameState::WaitingForPlayers {
                return Err(GameError::GameAlreadyStarted(room_id.clone()));
            }

            let message = format!(
                "Game starting in {} seconds",
                state.countdown_delay.as_secs()
            );
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(
                        UpdateKind::GameStartingCountdown,
                        room,
                        message,
                    ),
                )
                .await;
            schedule_start(Arc::clone(state), room_id, caller);
        }

        ClientRequest::StartGame { room_id } => {
            let caller = caller(state, conn_id).await?;
            let room = state.engine.start_game(&room_id, &caller).await?;
            let message = format!(
                "Game started! Current range: {}-{}",
                room.min_range, room.max_range
            );
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(UpdateKind::GameStarted, room, message),
                )
                .await;
        }

        ClientRequest::Guess { room_id, guess } => {
            let caller = caller(state, conn_id).await?;
            let (room, turn) =
                state.engine.make_guess(&room_id, &caller, guess).await?;
            let message = turn.result.clone();
            state
                .broadcaster
                .send_room(&room_id, GameUpdate::guess(room, turn, message))
                .await;
        }

        ClientRequest::QuitGame {
            room_id,
            player_name,
        } => {
            let (room, removed_id) =
                state.engine.quit_game(&room_id, &player_name).await?;
            state.broadcaster.unsubscribe(&room_id, &removed_id).await;
            if state.sessions.player(conn_id).await == Some(removed_id) {
                state.sessions.unbind(conn_id).await;
            }
            let _ = tx.send(GameUpdate::notice(
                UpdateKind::PlayerQuit,
                "You left the game",
            ));

            if room.players.is_empty() {
                state.broadcaster.drop_room(&room_id).await;
            } else {
                let message = format!("{player_name} left the game");
                state
                    .broadcaster
                    .send_room(
                        &room_id,
                        GameUpdate::with_room(
                            UpdateKind::PlayerQuit,
                            room,
                            message,
                        ),
                    )
                    .await;
            }
        }

        ClientRequest::RestartGame { room_id } => {
            let caller = caller(state, conn_id).await?;
            let room = state.engine.restart_game(&room_id, &caller).await?;
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(
                        UpdateKind::GameRestarted,
                        room,
                        "Game reset, waiting for players",
                    ),
                )
                .await;
        }

        ClientRequest::RemovePlayer {
            room_id,
            player_name,
        } => {
            let caller = caller(state, conn_id).await?;
            let (room, removed_id) = state
                .engine
                .remove_player(&room_id, &caller, &player_name)
                .await?;
            state
                .broadcaster
                .send_to(
                    &room_id,
                    &removed_id,
                    GameUpdate::notice(
                        UpdateKind::PlayerKicked,
                        "You were removed from the room",
                    ),
                )
                .await;
            state.broadcaster.unsubscribe(&room_id, &removed_id).await;
            let message = format!("{player_name} was removed from the room");
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(
                        UpdateKind::PlayerRemoved,
                        room,
                        message,
                    ),
                )
                .await;
        }

        ClientRequest::Decide {
            room_id,
            play_again,
        } => {
            let caller = caller(state, conn_id).await?;
            let (room, verdict) = state
                .engine
                .record_decision(&room_id, &caller, play_again)
                .await?;
            let name = room
                .player(&caller)
                .map(|p| p.name.clone())
                .unwrap_or_default();
            let message = if play_again {
                format!("{name} wants to play again")
            } else {
                format!("{name} is done playing")
            };
            state
                .broadcaster
                .send_room(
                    &room_id,
                    GameUpdate::with_room(
                        UpdateKind::PlayerDecided,
                        room,
                        message,
                    ),
                )
                .await;

            if let Some(all_play_again) = verdict {
                let update = GameUpdate {
                    kind: UpdateKind::AllPlayersDecided,
                    room: None,
                    last_turn: None,
                    message: "All players have decided".into(),
                    all_play_again: Some(all_play_again),
                };
                state.broadcaster.send_room(&room_id, update).await;
            }
        }
    }

    Ok(())
}

/// Resolves the player bound to this connection.
async fn caller(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
) -> Result<PlayerId, GameError> {
    state.sessions.player(conn_id).await.ok_or_else(|| {
        GameError::Unauthorized("no player bound to this connection".into())
    })
}
