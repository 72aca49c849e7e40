//! End-to-end tests: real WebSocket clients against a bound server.
//!
//! Each test starts its own server on an ephemeral port, drives it with
//! `tokio-tungstenite` clients speaking the JSON wire protocol, and
//! asserts on the events that come back. `recv_until` skips unrelated
//! broadcasts (room updates and the like) so tests stay focused.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::{GameServer, ServerConfig};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start() -> String {
    let server = GameServer::bind(ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        cors_origin: "*".to_string(),
        analytics_endpoint: None,
    })
    .await
    .expect("bind");
    let addr = server.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn ws(addr: &str) -> Ws {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client connect");
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send");
}

async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("recv");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("event json");
        }
    }
}

/// Receives events until one of the given type arrives.
async fn recv_until(ws: &mut Ws, event_type: &str) -> Value {
    for _ in 0..50 {
        let event = recv(ws).await;
        if event["type"] == event_type {
            return event;
        }
    }
    panic!("no {event_type} event within 50 messages");
}

async fn join(ws: &mut Ws, name: &str, game_type: &str) -> String {
    send(
        ws,
        json!({"type": "join_game", "playerName": name, "gameType": game_type}),
    )
    .await;
    let joined = recv_until(ws, "joined").await;
    joined["roomId"].as_str().unwrap().to_string()
}

async fn join_room(ws: &mut Ws, room_id: &str, name: &str) -> Value {
    send(
        ws,
        json!({"type": "join_game", "roomId": room_id, "playerName": name}),
    )
    .await;
    recv_until(ws, "joined").await
}

// ---------------------------------------------------------------------------
// Chess flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chess_join_start_move_broadcast() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;

    let room_id = join(&mut p1, "ada", "chess").await;
    assert_eq!(room_id.len(), 6);
    let joined = join_room(&mut p2, &room_id, "bob").await;
    assert_eq!(joined["color"], "black");
    assert_eq!(joined["reconnected"], false);

    send(&mut p1, json!({"type": "start_game"})).await;
    recv_until(&mut p1, "game_started").await;
    let state = recv_until(&mut p1, "game_state").await;
    assert!(state["fen"]
        .as_str()
        .unwrap()
        .starts_with("rnbqkbnr/pppppppp"));
    assert_eq!(state["turn"], "w");
    assert_eq!(state["inCheck"], false);
    assert_eq!(state["players"][0]["color"], "white");
    // Drain black's copy of the initial snapshot too.
    recv_until(&mut p2, "game_state").await;

    // 1.e4, broadcast to both sides.
    send(
        &mut p1,
        json!({"type": "make_move",
               "from": {"row": 6, "col": 4}, "to": {"row": 4, "col": 4}}),
    )
    .await;
    let after = recv_until(&mut p1, "game_state").await;
    assert_eq!(after["turn"], "b");
    let after2 = recv_until(&mut p2, "game_state").await;
    assert_eq!(after2["fen"], after["fen"]);

    // White again out of turn: rejection goes to the sender only.
    send(
        &mut p1,
        json!({"type": "make_move",
               "from": {"row": 6, "col": 3}, "to": {"row": 4, "col": 3}}),
    )
    .await;
    let rejected = recv_until(&mut p1, "invalid_move").await;
    assert_eq!(rejected["reason"], "Not your turn");
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    send(
        &mut p1,
        json!({"type": "join_game", "roomId": "ZZZZZZ", "playerName": "ada"}),
    )
    .await;
    let error = recv_until(&mut p1, "error").await;
    assert_eq!(error["message"], "Room not found");
}

#[tokio::test]
async fn test_start_requires_host_and_enough_players() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;

    let room_id = join(&mut p1, "ada", "chess").await;
    send(&mut p1, json!({"type": "start_game"})).await;
    let error = recv_until(&mut p1, "error").await;
    assert_eq!(error["message"], "Not enough players");

    join_room(&mut p2, &room_id, "bob").await;
    send(&mut p2, json!({"type": "start_game"})).await;
    let error = recv_until(&mut p2, "error").await;
    assert_eq!(error["message"], "Only the host can start the game");
}

// ---------------------------------------------------------------------------
// Big two
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_bigtwo_private_hands_and_first_play() {
    let addr = start().await;
    let mut clients = Vec::new();
    let mut first = ws(&addr).await;
    let room_id = join(&mut first, "p0", "chordaidi").await;
    clients.push(first);
    for i in 1..4 {
        let mut c = ws(&addr).await;
        join_room(&mut c, &room_id, &format!("p{i}")).await;
        clients.push(c);
    }

    send(&mut clients[0], json!({"type": "start_game"})).await;

    let mut hands: Vec<Vec<u64>> = Vec::new();
    let mut current_seat = 0;
    for client in clients.iter_mut() {
        let state = recv_until(client, "game_state").await;
        assert_eq!(state["gameType"], "chordaidi");
        assert_eq!(
            state["handCounts"],
            json!([13, 13, 13, 13]),
            "counts are public"
        );
        let hand: Vec<u64> = state["myHand"]
            .as_array()
            .expect("own hand present")
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
        assert_eq!(hand.len(), 13);
        current_seat = state["currentSeat"].as_u64().unwrap() as usize;
        hands.push(hand);
    }

    // Each client sees only its own cards; together they hold the deck.
    let mut all: Vec<u64> = hands.iter().flatten().copied().collect();
    all.sort();
    assert_eq!(all, (0..52).collect::<Vec<u64>>());

    // The holder of the 3 of diamonds acts first.
    let opener = hands.iter().position(|h| h.contains(&0)).unwrap();
    assert_eq!(opener, current_seat);

    // Someone else cannot act yet.
    let other = (opener + 1) % 4;
    send(&mut clients[other], json!({"type": "cdi_pass"})).await;
    let rejected = recv_until(&mut clients[other], "invalid_move").await;
    assert_eq!(rejected["reason"], "Not your turn");

    // An opener without the 3 of diamonds is refused.
    let high = *hands[opener].last().unwrap();
    send(
        &mut clients[opener],
        json!({"type": "cdi_play", "cardIds": [high]}),
    )
    .await;
    let rejected = recv_until(&mut clients[opener], "invalid_move").await;
    assert_eq!(rejected["reason"], "First play must include 3♦");

    // The real opener: single 3 of diamonds.
    send(
        &mut clients[opener],
        json!({"type": "cdi_play", "cardIds": [0]}),
    )
    .await;
    for (i, client) in clients.iter_mut().enumerate() {
        let state = recv_until(client, "game_state").await;
        assert_eq!(state["tableCombo"]["type"], "single");
        assert_eq!(state["tableCombo"]["cardIds"], json!([0]));
        assert_eq!(state["tableOwner"], opener);
        let counts = state["handCounts"].as_array().unwrap();
        let total: u64 =
            counts.iter().map(|c| c.as_u64().unwrap()).sum();
        assert_eq!(total, 51);
        if i == opener {
            assert!(!state["myHand"]
                .as_array()
                .unwrap()
                .iter()
                .any(|v| v == 0));
        }
    }
}

#[tokio::test]
async fn test_bigtwo_reconnect_preserves_hand() {
    let addr = start().await;
    let mut clients = Vec::new();
    let mut first = ws(&addr).await;
    let room_id = join(&mut first, "p0", "chordaidi").await;
    clients.push(first);
    for i in 1..4 {
        let mut c = ws(&addr).await;
        join_room(&mut c, &room_id, &format!("p{i}")).await;
        clients.push(c);
    }
    send(&mut clients[0], json!({"type": "start_game"})).await;

    let state = recv_until(&mut clients[3], "game_state").await;
    let hand_before = state["myHand"].clone();

    // p3's socket dies; a fresh one reclaims the seat by name.
    clients.pop().unwrap().close(None).await.unwrap();
    let mut back = ws(&addr).await;
    send(
        &mut back,
        json!({"type": "join_game", "roomId": room_id,
               "playerName": "p3", "reconnect": true}),
    )
    .await;
    let joined = recv_until(&mut back, "joined").await;
    assert_eq!(joined["reconnected"], true);
    assert_eq!(joined["color"], "east");

    let snapshot = recv_until(&mut back, "game_state").await;
    assert_eq!(snapshot["myHand"], hand_before);
}

// ---------------------------------------------------------------------------
// Boggle & bingo
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_boggle_round_flow() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let room_id = join(&mut p1, "ada", "boggle").await;
    join_room(&mut p2, &room_id, "bob").await;

    send(&mut p1, json!({"type": "start_game"})).await;
    let state = recv_until(&mut p1, "game_state").await;
    assert_eq!(state["gameType"], "boggle");
    assert_eq!(state["board"].as_array().unwrap().len(), 16);
    assert!(state["timeLeft"].as_u64().unwrap() > 170);
    assert!(state.get("scores").is_none(), "no scores mid-round");

    // Nonsense is rejected to the submitter only.
    send(&mut p1, json!({"type": "boggle_submit", "word": "xqzjw"})).await;
    let rejected = recv_until(&mut p1, "boggle_reject").await;
    assert_eq!(rejected["word"], "XQZJW");
    assert_eq!(rejected["reason"], "Not a valid word");

    // Only the host may cut the round short.
    send(&mut p2, json!({"type": "boggle_end"})).await;
    let error = recv_until(&mut p2, "error").await;
    assert_eq!(error["message"], "Only the host can end the round");

    send(&mut p1, json!({"type": "boggle_end"})).await;
    let final_state = recv_until(&mut p1, "game_state").await;
    assert_eq!(final_state["isGameOver"], true);
    assert!(final_state["scores"].is_array());
    assert!(final_state["words"].is_array());
    let over = recv_until(&mut p1, "game_over").await;
    assert_eq!(over["reason"], "round over");
    let over2 = recv_until(&mut p2, "game_over").await;
    assert_eq!(over2["reason"], "round over");
}

#[tokio::test]
async fn test_bingo_only_caller_draws() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let room_id = join(&mut p1, "ada", "bingo").await;
    join_room(&mut p2, &room_id, "bob").await;

    send(&mut p1, json!({"type": "start_game"})).await;
    let state = recv_until(&mut p2, "game_state").await;
    assert_eq!(state["gameType"], "bingo");
    assert_eq!(state["callerSeat"], 0);
    assert_eq!(state["cards"].as_array().unwrap().len(), 2);
    // Drain the caller's copy of the initial snapshot.
    recv_until(&mut p1, "game_state").await;

    send(&mut p2, json!({"type": "bingo_call"})).await;
    let rejected = recv_until(&mut p2, "invalid_move").await;
    assert_eq!(rejected["reason"], "Only the caller can call numbers");

    send(&mut p1, json!({"type": "bingo_call"})).await;
    let state = recv_until(&mut p1, "game_state").await;
    assert_eq!(state["called"].as_array().unwrap().len(), 1);
    let n = state["lastCalled"].as_u64().unwrap();
    assert!((1..=75).contains(&n));
}

// ---------------------------------------------------------------------------
// Transport-level behavior
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_command_gets_error() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    p1.send(Message::Text("not json at all".into()))
        .await
        .unwrap();
    let error = recv_until(&mut p1, "error").await;
    assert_eq!(error["message"], "Malformed command");
}

#[tokio::test]
async fn test_ping_pong() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    send(&mut p1, json!({"type": "ping"})).await;
    let pong = recv(&mut p1).await;
    assert_eq!(pong["type"], "pong");
}

#[tokio::test]
async fn test_health_endpoint_reports_counts() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    join(&mut p1, "ada", "chess").await;

    let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let json: Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["rooms"], 1);
    assert_eq!(json["connections"], 1);
}

#[tokio::test]
async fn test_fresh_joins_are_rate_limited_per_ip() {
    let addr = start().await;
    let mut sockets = Vec::new();

    for i in 0..10 {
        let mut c = ws(&addr).await;
        send(
            &mut c,
            json!({"type": "join_game", "playerName": format!("p{i}"),
                   "gameType": "chess"}),
        )
        .await;
        recv_until(&mut c, "joined").await;
        sockets.push(c);
    }

    let mut blocked = ws(&addr).await;
    send(
        &mut blocked,
        json!({"type": "join_game", "playerName": "late",
               "gameType": "chess"}),
    )
    .await;
    let error = recv_until(&mut blocked, "error").await;
    assert_eq!(error["message"], "Too many join attempts, try again later");
}

#[tokio::test]
async fn test_name_required() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    send(
        &mut p1,
        json!({"type": "join_game", "playerName": "   ",
               "gameType": "chess"}),
    )
    .await;
    let error = recv_until(&mut p1, "error").await;
    assert_eq!(error["message"], "Name required");
}

// ---------------------------------------------------------------------------
// Undo & resign
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_undo_request_approve_cycle() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let room_id = join(&mut p1, "ada", "chess").await;
    join_room(&mut p2, &room_id, "bob").await;
    send(&mut p1, json!({"type": "start_game"})).await;
    let initial = recv_until(&mut p1, "game_state").await;

    send(
        &mut p1,
        json!({"type": "make_move",
               "from": {"row": 6, "col": 4}, "to": {"row": 4, "col": 4}}),
    )
    .await;
    recv_until(&mut p1, "game_state").await;

    // White regrets it; black hears about it and approves.
    send(&mut p1, json!({"type": "request_undo"})).await;
    let request = recv_until(&mut p2, "undo_requested").await;
    assert_eq!(request["from"], "ada");

    send(&mut p2, json!({"type": "approve_undo"})).await;
    let rewound = recv_until(&mut p1, "game_state").await;
    assert_eq!(rewound["fen"], initial["fen"]);
    assert_eq!(rewound["turn"], "w");
}

#[tokio::test]
async fn test_undo_decline_notifies_requester() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let room_id = join(&mut p1, "ada", "chess").await;
    join_room(&mut p2, &room_id, "bob").await;
    send(&mut p1, json!({"type": "start_game"})).await;

    send(
        &mut p1,
        json!({"type": "make_move",
               "from": {"row": 6, "col": 4}, "to": {"row": 4, "col": 4}}),
    )
    .await;
    send(&mut p1, json!({"type": "request_undo"})).await;
    recv_until(&mut p2, "undo_requested").await;
    send(&mut p2, json!({"type": "decline_undo"})).await;
    recv_until(&mut p1, "undo_declined").await;

    // Approving after the decline finds nothing pending.
    send(&mut p2, json!({"type": "approve_undo"})).await;
    let error = recv_until(&mut p2, "error").await;
    assert_eq!(error["message"], "No undo request pending");
}

#[tokio::test]
async fn test_resign_ends_game_for_opponent() {
    let addr = start().await;
    let mut p1 = ws(&addr).await;
    let mut p2 = ws(&addr).await;
    let room_id = join(&mut p1, "ada", "chess").await;
    join_room(&mut p2, &room_id, "bob").await;
    send(&mut p1, json!({"type": "start_game"})).await;

    send(&mut p2, json!({"type": "resign"})).await;
    let over = recv_until(&mut p1, "game_over").await;
    assert_eq!(over["winner"], "white");
    assert_eq!(over["reason"], "resign");

    // The engine is gone; further moves are refused.
    send(
        &mut p1,
        json!({"type": "make_move",
               "from": {"row": 6, "col": 4}, "to": {"row": 4, "col": 4}}),
    )
    .await;
    let rejected = recv_until(&mut p1, "invalid_move").await;
    assert_eq!(rejected["reason"], "Game not started");
}
