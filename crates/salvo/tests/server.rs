//! End-to-end tests: a real server on a random port and real WebSocket
//! clients speaking the JSON protocol.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use salvo::prelude::*;
use salvo_protocol::{AddUserToRoomRequest, RegRequest, RegResponse};
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = SalvoServerBuilder::new()
        .bind("127.0.0.1:0")
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

    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, msg: ClientMessage) {
    let bytes = msg.encode(&JsonCodec).expect("encode");
    let text = String::from_utf8(bytes).expect("json is utf-8");
    ws.send(Message::text(text)).await.expect("send");
}

/// Reads the next protocol message, failing the test after two seconds.
async fn recv(ws: &mut ClientWs) -> ServerMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("message in time")
            .expect("stream open")
            .expect("valid frame");
        if msg.is_text() {
            return ServerMessage::decode(&JsonCodec, &msg.into_data()).expect("decode");
        }
        assert!(!msg.is_close(), "server closed the connection");
    }
}

/// Reads until the `reg` reply, skipping broadcasts caused by other
/// clients' registrations.
async fn recv_reg_reply(ws: &mut ClientWs) -> RegResponse {
    loop {
        if let ServerMessage::Registered(reply) = recv(ws).await {
            return reply;
        }
    }
}

/// Registers and consumes the reply plus the two broadcasts.
async fn register(ws: &mut ClientWs, name: &str) -> PlayerId {
    send(
        ws,
        ClientMessage::Register(RegRequest {
            name: name.into(),
            password: "secret".into(),
        }),
    )
    .await;
    let reply = recv_reg_reply(ws).await;
    assert!(!reply.error, "registration failed: {}", reply.error_text);
    assert!(matches!(recv(ws).await, ServerMessage::UpdateRoom(_)));
    assert!(matches!(recv(ws).await, ServerMessage::UpdateWinners(_)));
    reply.index.expect("index on success")
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_register_reply_arrives_as_text_frame() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        ClientMessage::Register(RegRequest {
            name: "ahab".into(),
            password: "whale".into(),
        }),
    )
    .await;

    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply in time")
        .expect("stream open")
        .expect("valid frame");
    assert!(frame.is_text(), "expected text frame, got {frame:?}");
    let raw: serde_json::Value = serde_json::from_slice(&frame.into_data()).unwrap();
    assert_eq!(raw["type"], "reg");
    assert_eq!(raw["id"], 0);
    let data: serde_json::Value = serde_json::from_str(raw["data"].as_str().unwrap()).unwrap();
    assert_eq!(data["name"], "ahab");
    assert_eq!(data["index"], 0);
    assert_eq!(data["error"], false);
}

#[tokio::test]
async fn test_register_wrong_password_over_socket() {
    let addr = start_server().await;
    let mut first = connect(&addr).await;
    register(&mut first, "ahab").await;

    let mut second = connect(&addr).await;
    send(
        &mut second,
        ClientMessage::Register(RegRequest {
            name: "ahab".into(),
            password: "guess".into(),
        }),
    )
    .await;

    let reply = recv_reg_reply(&mut second).await;
    assert!(reply.error);
    assert_eq!(reply.index, None);
}

#[tokio::test]
async fn test_matchmaking_over_socket_creates_game() {
    let addr = start_server().await;
    let mut ahab = connect(&addr).await;
    let mut moby = connect(&addr).await;
    let ahab_id = register(&mut ahab, "ahab").await;
    // Moby's registration is broadcast to Ahab as well.
    let moby_id = register(&mut moby, "moby").await;
    assert!(matches!(recv(&mut ahab).await, ServerMessage::UpdateRoom(_)));
    assert!(matches!(recv(&mut ahab).await, ServerMessage::UpdateWinners(_)));

    send(&mut ahab, ClientMessage::CreateRoom).await;
    let ServerMessage::UpdateRoom(rooms) = recv(&mut moby).await else {
        panic!("expected update_room");
    };
    assert_eq!(rooms.len(), 1);
    let room_id = rooms[0].room_id;

    send(
        &mut moby,
        ClientMessage::AddUserToRoom(AddUserToRoomRequest { index_room: room_id }),
    )
    .await;

    let ServerMessage::CreateGame(mine) = recv(&mut moby).await else {
        panic!("expected create_game");
    };
    assert_eq!(mine.id_player, moby_id);

    // Ahab still has the create_room broadcast queued.
    assert!(matches!(recv(&mut ahab).await, ServerMessage::UpdateRoom(_)));
    let ServerMessage::CreateGame(theirs) = recv(&mut ahab).await else {
        panic!("expected create_game");
    };
    assert_eq!(theirs.id_player, ahab_id);
    assert_eq!(theirs.id_game, mine.id_game);
}

#[tokio::test]
async fn test_peer_disconnect_mid_game_sends_finish_without_winner() {
    let addr = start_server().await;
    let mut ahab = connect(&addr).await;
    let mut moby = connect(&addr).await;
    register(&mut ahab, "ahab").await;
    register(&mut moby, "moby").await;

    send(&mut ahab, ClientMessage::CreateRoom).await;
    assert!(matches!(recv(&mut moby).await, ServerMessage::UpdateRoom(_)));
    send(
        &mut moby,
        ClientMessage::AddUserToRoom(AddUserToRoomRequest { index_room: RoomId(0) }),
    )
    .await;
    assert!(matches!(recv(&mut moby).await, ServerMessage::CreateGame(_)));
    assert!(matches!(recv(&mut moby).await, ServerMessage::UpdateRoom(_)));

    ahab.close(None).await.expect("close");

    let ServerMessage::Finish(finish) = recv(&mut moby).await else {
        panic!("expected finish");
    };
    assert_eq!(finish.win_player, None);
}

#[tokio::test]
async fn test_reconnect_right_after_close_logs_back_in() {
    let addr = start_server().await;
    let mut first = connect(&addr).await;
    let id = register(&mut first, "ahab").await;

    first.close(None).await.expect("close");
    // Wait for the server's half of the close handshake.
    while let Ok(Some(Ok(_))) = tokio::time::timeout(Duration::from_secs(2), first.next()).await {}

    let mut second = connect(&addr).await;
    send(
        &mut second,
        ClientMessage::Register(RegRequest {
            name: "ahab".into(),
            password: "secret".into(),
        }),
    )
    .await;
    let reply = recv_reg_reply(&mut second).await;
    assert!(!reply.error, "reconnect refused: {}", reply.error_text);
    assert_eq!(reply.index, Some(id));
}

#[tokio::test]
async fn test_garbage_frame_keeps_connection_open() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("definitely not an envelope")).await.unwrap();
    ws.send(Message::binary(vec![0xff, 0x00])).await.unwrap();

    // The connection still works afterwards.
    register(&mut ws, "ahab").await;
}

#[tokio::test]
async fn test_run_until_stops_on_shutdown_signal() {
    let server = SalvoServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let running = tokio::spawn(server.run_until(async {
        let _ = stop_rx.await;
    }));
    stop_tx.send(()).expect("server waiting");

    let result = tokio::time::timeout(Duration::from_secs(2), running)
        .await
        .expect("server stops in time")
        .expect("task did not panic");
    assert!(result.is_ok());
}
