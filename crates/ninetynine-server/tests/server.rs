//! Integration tests for the server: full WebSocket round trips from
//! room creation to a finished game.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ninetynine_server::GameServer;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns the address. The
/// countdown is shortened so countdown tests stay fast.
async fn start_server() -> String {
    let server = GameServer::builder()
        .bind("127.0.0.1:0")
        .countdown_delay(Duration::from_millis(50))
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, request: Value) {
    ws.send(Message::Text(request.to_string().into()))
        .await
        .expect("send request");
}

/// Receives the next `GameUpdate` as raw JSON.
async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for update")
            .expect("stream ended")
            .expect("recv failed");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("parse update");
        }
    }
}

/// Asserts that no update arrives within a short window.
async fn assert_silent(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(result.is_err(), "expected no update, got {result:?}");
}

/// Creates a room and returns (host socket, room id).
async fn create_room(addr: &str, host_name: &str) -> (ClientWs, String) {
    let mut ws = connect(addr).await;
    send(
        &mut ws,
        json!({"type": "CreateRoom", "player_name": host_name}),
    )
    .await;
    let update = recv(&mut ws).await;
    assert_eq!(update["type"], "ROOM_CREATED");
    let room_id = update["room"]["room_id"]
        .as_str()
        .expect("room id")
        .to_string();
    (ws, room_id)
}

/// Joins a room; drains the PLAYER_JOINED broadcast on both sockets.
async fn join_room(
    addr: &str,
    host: &mut ClientWs,
    room_id: &str,
    name: &str,
) -> ClientWs {
    let mut ws = connect(addr).await;
    send(
        &mut ws,
        json!({"type": "JoinRoom", "room_id": room_id, "player_name": name}),
    )
    .await;
    let update = recv(&mut ws).await;
    assert_eq!(update["type"], "PLAYER_JOINED");
    let broadcast = recv(host).await;
    assert_eq!(broadcast["type"], "PLAYER_JOINED");
    ws
}

// =========================================================================
// Room lifecycle
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_room_created() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, json!({"type": "CreateRoom", "player_name": "Alice"})).await;
    let update = recv(&mut ws).await;

    assert_eq!(update["type"], "ROOM_CREATED");
    let room = &update["room"];
    assert_eq!(room["state"], "WaitingForPlayers");
    assert_eq!(room["players"].as_array().unwrap().len(), 1);
    assert_eq!(room["players"][0]["name"], "Alice");
    assert_eq!(room["players"][0]["is_host"], true);
    // The secret never crosses the wire.
    assert!(room.get("secret_number").is_none());
    // Room ids are short numeric codes.
    let id = room["room_id"].as_str().unwrap();
    assert!(id.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn test_join_room_broadcasts_to_all_members() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;

    let mut joiner = connect(&addr).await;
    send(
        &mut joiner,
        json!({"type": "JoinRoom", "room_id": room_id, "player_name": "Bob"}),
    )
    .await;

    let seen_by_joiner = recv(&mut joiner).await;
    let seen_by_host = recv(&mut host).await;
    for update in [&seen_by_joiner, &seen_by_host] {
        assert_eq!(update["type"], "PLAYER_JOINED");
        assert_eq!(update["room"]["players"].as_array().unwrap().len(), 2);
        assert_eq!(update["message"], "Bob joined the game");
    }
}

#[tokio::test]
async fn test_join_unknown_room_returns_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        json!({"type": "JoinRoom", "room_id": "0000", "player_name": "Bob"}),
    )
    .await;
    let update = recv(&mut ws).await;
    assert_eq!(update["type"], "ERROR");
    assert!(update["message"].as_str().unwrap().contains("0000"));
}

#[tokio::test]
async fn test_invalid_json_gets_error_reply() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::Text("not json".into())).await.unwrap();
    let update = recv(&mut ws).await;
    assert_eq!(update["type"], "ERROR");

    // The connection survives a bad frame.
    send(&mut ws, json!({"type": "CreateRoom", "player_name": "Alice"})).await;
    assert_eq!(recv(&mut ws).await["type"], "ROOM_CREATED");
}

#[tokio::test]
async fn test_request_without_identity_is_unauthorized() {
    let addr = start_server().await;
    let (_host, room_id) = create_room(&addr, "Alice").await;

    // A connection that never created or joined anything.
    let mut stranger = connect(&addr).await;
    send(&mut stranger, json!({"type": "StartGame", "room_id": room_id}))
        .await;
    let update = recv(&mut stranger).await;
    assert_eq!(update["type"], "ERROR");
}

// =========================================================================
// Game start
// =========================================================================

#[tokio::test]
async fn test_start_game_requires_host() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(&mut joiner, json!({"type": "StartGame", "room_id": room_id}))
        .await;
    let update = recv(&mut joiner).await;
    assert_eq!(update["type"], "ERROR");

    // The failure is private to the caller.
    assert_silent(&mut host).await;
}

#[tokio::test]
async fn test_start_game_broadcasts_to_room() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(&mut host, json!({"type": "StartGame", "room_id": room_id})).await;
    for ws in [&mut host, &mut joiner] {
        let update = recv(ws).await;
        assert_eq!(update["type"], "GAME_STARTED");
        let room = &update["room"];
        assert_eq!(room["state"], "InProgress");
        assert_eq!(room["min_range"], 1);
        assert_eq!(room["max_range"], 99);
        assert_eq!(room["current_player_index"], 0);
    }
}

#[tokio::test]
async fn test_countdown_announces_then_starts() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(
        &mut host,
        json!({"type": "StartCountdown", "room_id": room_id}),
    )
    .await;
    for ws in [&mut host, &mut joiner] {
        assert_eq!(recv(ws).await["type"], "GAME_STARTING_COUNTDOWN");
    }
    for ws in [&mut host, &mut joiner] {
        let update = recv(ws).await;
        assert_eq!(update["type"], "GAME_STARTED");
        assert_eq!(update["room"]["state"], "InProgress");
    }
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_guess_out_of_turn_is_rejected() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(&mut host, json!({"type": "StartGame", "room_id": room_id})).await;
    let started = recv(&mut host).await;
    let _ = recv(&mut joiner).await;

    // Whoever is NOT first in the shuffled order guesses anyway.
    let waiting_name = started["room"]["players"][1]["name"].as_str().unwrap();
    let waiting = if waiting_name == "Alice" {
        &mut host
    } else {
        &mut joiner
    };
    send(waiting, json!({"type": "Guess", "room_id": room_id, "guess": 50}))
        .await;
    let update = recv(waiting).await;
    assert_eq!(update["type"], "ERROR");
    assert!(update["message"].as_str().unwrap().contains("not your turn"));
}

/// Plays a full game by binary search: the current player always
/// guesses the middle of the advertised range, so someone must hit the
/// secret within seven turns.
#[tokio::test]
async fn test_full_game_reaches_finished_state() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(&mut host, json!({"type": "StartGame", "room_id": room_id})).await;
    let mut latest = recv(&mut host).await;
    let _ = recv(&mut joiner).await;

    for _ in 0..10 {
        let room = &latest["room"];
        let index = room["current_player_index"].as_u64().unwrap() as usize;
        let current_name =
            room["players"][index]["name"].as_str().unwrap().to_string();
        let min = room["min_range"].as_i64().unwrap();
        let max = room["max_range"].as_i64().unwrap();
        let guess = (min + max) / 2;

        let current = if current_name == "Alice" {
            &mut host
        } else {
            &mut joiner
        };
        send(
            current,
            json!({"type": "Guess", "room_id": room_id, "guess": guess}),
        )
        .await;

        let seen_by_host = recv(&mut host).await;
        let seen_by_joiner = recv(&mut joiner).await;
        assert_eq!(seen_by_host, seen_by_joiner);
        assert_eq!(seen_by_host["type"], "GUESS_MADE");
        assert_eq!(seen_by_host["last_turn"]["guess"], guess);

        latest = seen_by_host;
        if latest["room"]["state"] == "Finished" {
            let message = latest["message"].as_str().unwrap();
            assert!(message.contains("SECRET NUMBER GUESSED"));
            assert!(message.contains(&current_name));
            return;
        }
    }
    panic!("binary search failed to finish the game within 10 guesses");
}

// =========================================================================
// Leaving and restarting
// =========================================================================

#[tokio::test]
async fn test_quit_game_notifies_remaining_players() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(
        &mut joiner,
        json!({"type": "QuitGame", "room_id": room_id, "player_name": "Bob"}),
    )
    .await;

    let to_quitter = recv(&mut joiner).await;
    assert_eq!(to_quitter["type"], "PLAYER_QUIT");
    assert_eq!(to_quitter["message"], "You left the game");

    let to_host = recv(&mut host).await;
    assert_eq!(to_host["type"], "PLAYER_QUIT");
    assert_eq!(to_host["message"], "Bob left the game");
    assert_eq!(to_host["room"]["players"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_last_player_quit_destroys_room() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;

    send(
        &mut host,
        json!({"type": "QuitGame", "room_id": room_id, "player_name": "Alice"}),
    )
    .await;
    assert_eq!(recv(&mut host).await["type"], "PLAYER_QUIT");

    // The room id is no longer joinable.
    let mut late = connect(&addr).await;
    send(
        &mut late,
        json!({"type": "JoinRoom", "room_id": room_id, "player_name": "Eve"}),
    )
    .await;
    assert_eq!(recv(&mut late).await["type"], "ERROR");
}

#[tokio::test]
async fn test_remove_player_notifies_kicked_and_room() {
    let addr = start_server().await;
    let (mut host, room_id) = create_room(&addr, "Alice").await;
    let mut joiner = join_room(&addr, &mut host, &room_id, "Bob").await;

    send(
        &mut host,
        json!({"type": "RemovePlayer", "room_id": room_id, "player_name": "Bob"}),
    )
    .await;

    let to_kicked = recv(&mut joiner).await;
    assert_eq!(to_kicked["type"], "PLAYER_KICKED");
    assert_eq!(to_kicked["message"], "You were removed from the room");

    let to_host = recv(&mut host).await;
    assert_eq!(to_host["type"], "PLAYER_REMOVED");
    assert_eq!(to_host["room"]["players"].as_array().unwrap().len(), 1);

    // No further updates reach the kicked player.
    assert_silent(&mut joiner).await;
}
