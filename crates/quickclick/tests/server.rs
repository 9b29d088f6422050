//! End-to-end tests: a real server on an OS-assigned port, driven by
//! `tokio-tungstenite` clients speaking the JSON protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use quickclick::prelude::*;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start_server(config: RoomConfig) -> (String, RoomHandle) {
    start_with(QuickClickServer::builder().room_config(config)).await
}

async fn start_with(builder: ServerBuilder) -> (String, RoomHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should bind");
    let addr = server.local_addr().expect("local addr").to_string();
    let room = server.room();
    tokio::spawn(server.run());
    (addr, room)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("client should connect");
    ws
}

async fn send(ws: &mut ClientWs, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("send should succeed");
}

async fn recv(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("server should answer in time")
            .expect("stream should stay open")
            .expect("frame should be valid");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("server sends JSON");
        }
    }
}

/// Reads frames until one has `"type": kind`.
async fn recv_type(ws: &mut ClientWs, kind: &str) -> Value {
    loop {
        let value = recv(ws).await;
        if value["type"] == kind {
            return value;
        }
    }
}

async fn join(ws: &mut ClientWs, name: &str) {
    send(ws, json!({"type": "join", "name": name})).await;
    loop {
        let value = recv_type(ws, "addplayer").await;
        if value["name"] == name {
            return;
        }
    }
}

#[tokio::test]
async fn test_join_is_broadcast_to_every_connection() {
    let (addr, _room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    join(&mut alice, "Alice").await;
    assert_eq!(recv(&mut bob).await, json!({"type": "addplayer", "name": "Alice"}));
}

#[tokio::test]
async fn test_late_connection_gets_roster_replay() {
    let (addr, _room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    join(&mut alice, "Alice").await;

    let mut late = connect(&addr).await;
    assert_eq!(recv(&mut late).await, json!({"type": "addplayer", "name": "Alice"}));
}

#[tokio::test]
async fn test_duplicate_name_gets_login_notice() {
    let (addr, room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    let mut imposter = connect(&addr).await;
    join(&mut alice, "Alice").await;

    send(&mut imposter, json!({"type": "join", "name": "Alice"})).await;
    let notice = recv_type(&mut imposter, "noexec").await;
    assert_eq!(
        notice,
        json!({
            "type": "noexec",
            "message": "Someone is already using that name",
            "context": "login",
        })
    );
    assert_eq!(room.info().await.unwrap().players, vec!["Alice"]);
}

#[tokio::test]
async fn test_start_alone_gets_start_notice() {
    let (addr, room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    join(&mut alice, "Alice").await;

    send(&mut alice, json!({"type": "startGame"})).await;
    let notice = recv_type(&mut alice, "noexec").await;
    assert_eq!(notice["message"], "Not enough players... (min 2 players)");
    assert_eq!(notice["context"], "start");
    assert_eq!(room.info().await.unwrap().state, EngineState::Idle);
}

#[tokio::test]
async fn test_garbage_frame_keeps_connection_open() {
    let (addr, _room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;

    send(&mut alice, json!({"type": "dance"})).await;
    alice
        .send(Message::Binary(vec![0xff, 0xfe, 0x00].into()))
        .await
        .expect("send should succeed");
    send(&mut alice, json!({"type": "toggleJoin", "mode": "maybe"})).await;
    join(&mut alice, "Alice").await;
}

#[tokio::test]
async fn test_chat_reaches_everyone_with_sender_name() {
    let (addr, _room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut alice, "Alice").await;
    join(&mut bob, "Bob").await;

    send(&mut alice, json!({"type": "chat", "message": "hello"})).await;
    let chat = recv_type(&mut bob, "chatmessage").await;
    assert_eq!(chat, json!({"type": "chatmessage", "message": "hello", "sender": "Alice"}));
}

#[tokio::test]
async fn test_full_round_over_websocket() {
    let config = RoomConfig {
        start_delay: Duration::from_millis(20),
        countdown: Duration::from_millis(300),
        status_delay: Duration::from_millis(20),
        ..RoomConfig::default()
    };
    let (addr, room) = start_server(config).await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut alice, "Alice").await;
    join(&mut bob, "Bob").await;

    send(&mut alice, json!({"type": "startGame"})).await;
    recv_type(&mut alice, "startgame").await;
    let countdown = recv_type(&mut alice, "countdown").await;
    assert_eq!(countdown["seconds"], 1);

    send(&mut alice, json!({"type": "clickBtn", "name": "Alice"})).await;

    let status = recv_type(&mut bob, "showstatus").await;
    assert_eq!(
        status,
        json!({"type": "showstatus", "name": "Alice", "clicked": true, "points": 2.5})
    );
    let status = recv_type(&mut bob, "showstatus").await;
    assert_eq!(
        status,
        json!({"type": "showstatus", "name": "Bob", "clicked": false, "points": 3.0})
    );

    send(&mut alice, json!({"type": "roundAck"})).await;
    send(&mut bob, json!({"type": "roundAck"})).await;
    recv_type(&mut bob, "hidestatus").await;
    recv_type(&mut bob, "countdown").await;

    send(&mut bob, json!({"type": "endGame"})).await;
    recv_type(&mut alice, "endgame").await;
    assert_eq!(room.info().await.unwrap().state, EngineState::Ended);
}

#[tokio::test]
async fn test_closing_socket_removes_player() {
    let (addr, room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut alice, "Alice").await;
    join(&mut bob, "Bob").await;

    bob.close(None).await.expect("close should succeed");
    let removed = recv_type(&mut alice, "removeplayer").await;
    assert_eq!(removed["name"], "Bob");
    assert_eq!(room.info().await.unwrap().players, vec!["Alice"]);
}

#[tokio::test]
async fn test_silent_peer_does_not_block_new_players() {
    let (addr, room) = start_server(RoomConfig::default()).await;
    let _silent = tokio::net::TcpStream::connect(&addr)
        .await
        .expect("tcp connect");
    tokio::time::sleep(Duration::from_millis(20)).await;

    let mut alice = tokio::time::timeout(Duration::from_secs(3), connect(&addr))
        .await
        .expect("handshake must not wait behind an idle peer");
    join(&mut alice, "Alice").await;
    assert_eq!(room.info().await.unwrap().players, vec!["Alice"]);
}

#[tokio::test]
async fn test_idle_peer_is_dropped_after_handshake_timeout() {
    use tokio::io::AsyncReadExt;

    let (addr, room) = start_with(
        QuickClickServer::builder().handshake_timeout(Duration::from_millis(100)),
    )
    .await;
    let mut silent = tokio::net::TcpStream::connect(&addr)
        .await
        .expect("tcp connect");

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(3), silent.read(&mut buf))
        .await
        .expect("server should hang up on the idle peer");
    assert!(matches!(read, Ok(0) | Err(_)));
    assert_eq!(room.info().await.unwrap().connections, 0);
}

#[tokio::test]
async fn test_room_shutdown_closes_client_sockets() {
    let (addr, room) = start_server(RoomConfig::default()).await;
    let mut alice = connect(&addr).await;
    join(&mut alice, "Alice").await;

    room.shutdown().await.unwrap();

    let closed = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            match alice.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server should close the socket once the room is gone");
}
