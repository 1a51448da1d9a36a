//! Integration tests for the Pairplay server, handler, and full
//! connection flow over real WebSockets.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pairplay::prelude::*;
use tempfile::TempDir;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn test_config() -> ServerConfig {
    ServerConfig {
        bind_addr: "127.0.0.1:0".into(),
        ..ServerConfig::default()
    }
}

/// Starts a server with in-memory accounts and returns its address.
async fn start_server(config: ServerConfig) -> String {
    let server = PairplayServerBuilder::new()
        .config(config)
        .build_with_storage(MemoryStorage::new())
        .await
        .expect("server should build");
    spawn(server)
}

fn spawn<S: AccountStorage, C: Codec>(server: PairplayServer<S, C>) -> String {
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

async fn send(ws: &mut ClientWs, record: &str) {
    ws.send(Message::Text(record.into())).await.expect("send");
}

/// Waits for the next server message, decoded as UTF-8.
async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply within 2s")
        .expect("stream open")
        .expect("valid frame");
    Utf8Codec.decode(&msg.into_data()).expect("server sent a valid record")
}

/// Asserts nothing arrives for a short while.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(100), ws.next()).await;
    assert!(result.is_err(), "expected no message, got {result:?}");
}

/// Lets the server finish routing a message that produces no reply.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn login_response(result: LoginResult) -> ServerMessage {
    ServerMessage::LoginResponse(result)
}

// =========================================================================
// Accounts
// =========================================================================

#[tokio::test]
async fn test_account_flow() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, "2,ann,pw1").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::Success));

    send(&mut ws, "2,ann,pw2").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::NameInUse));

    send(&mut ws, "1,ann,pw1").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::Success));

    send(&mut ws, "1,ann,wrong").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::IncorrectPassword));

    send(&mut ws, "1,bob,x").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::NameNotFound));
}

#[tokio::test]
async fn test_accounts_survive_restart_with_file_storage() {
    let dir = TempDir::new().unwrap();
    let config = ServerConfig {
        accounts_file: dir.path().join("accounts.txt"),
        ..test_config()
    };

    let addr = spawn(
        PairplayServerBuilder::new()
            .config(config.clone())
            .build()
            .await
            .unwrap(),
    );
    let mut ws = connect(&addr).await;
    send(&mut ws, "2,ann,pw1").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::Success));

    // A second server over the same file sees the account.
    let addr = spawn(PairplayServerBuilder::new().config(config).build().await.unwrap());
    let mut ws = connect(&addr).await;
    send(&mut ws, "1,ann,pw1").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::Success));
}

#[tokio::test]
async fn test_build_fails_on_corrupt_account_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("accounts.txt");
    std::fs::write(&path, "no delimiter here\n").unwrap();

    let result = PairplayServerBuilder::new()
        .config(ServerConfig {
            accounts_file: path,
            ..test_config()
        })
        .build()
        .await;

    assert!(matches!(result, Err(PairplayError::Account(_))));
}

// =========================================================================
// Matchmaking and relay
// =========================================================================

#[tokio::test]
async fn test_match_and_relay() {
    let addr = start_server(test_config()).await;
    let mut first = connect(&addr).await;
    let mut second = connect(&addr).await;

    send(&mut first, "3").await;
    assert_silent(&mut first).await;

    send(&mut second, "3").await;
    assert_eq!(recv(&mut first).await, ServerMessage::GameSessionStarted);
    assert_eq!(recv(&mut second).await, ServerMessage::GameSessionStarted);

    send(&mut first, "4").await;
    assert_eq!(recv(&mut second).await, ServerMessage::OpponentTicTacToePlay(None));
    assert_silent(&mut first).await;

    send(&mut second, "4,1,2").await;
    assert_eq!(
        recv(&mut first).await,
        ServerMessage::OpponentTicTacToePlay(Some(Move::new(1, 2).unwrap()))
    );
}

#[tokio::test]
async fn test_third_player_waits_after_a_match() {
    let addr = start_server(test_config()).await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    let mut c = connect(&addr).await;

    send(&mut a, "3").await;
    settle().await;
    send(&mut b, "3").await;
    assert_eq!(recv(&mut a).await, ServerMessage::GameSessionStarted);
    assert_eq!(recv(&mut b).await, ServerMessage::GameSessionStarted);

    send(&mut c, "3").await;
    assert_silent(&mut c).await;
}

#[tokio::test]
async fn test_opponent_is_told_when_player_leaves() {
    let addr = start_server(test_config()).await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;

    send(&mut a, "3").await;
    settle().await;
    send(&mut b, "3").await;
    recv(&mut a).await;
    recv(&mut b).await;

    b.send(Message::Close(None)).await.unwrap();
    assert_eq!(recv(&mut a).await, ServerMessage::OpponentLeft);

    // The session is gone, so a move now has nowhere to go.
    send(&mut a, "4").await;
    assert_eq!(recv(&mut a).await, ServerMessage::Error(ErrorCode::NotInSession));
}

#[tokio::test]
async fn test_waiting_player_who_leaves_is_not_matched() {
    let addr = start_server(test_config()).await;
    let mut a = connect(&addr).await;
    send(&mut a, "3").await;
    settle().await;
    a.send(Message::Close(None)).await.unwrap();
    settle().await;

    let mut b = connect(&addr).await;
    let mut c = connect(&addr).await;
    send(&mut b, "3").await;
    assert_silent(&mut b).await;
    send(&mut c, "3").await;
    assert_eq!(recv(&mut b).await, ServerMessage::GameSessionStarted);
    assert_eq!(recv(&mut c).await, ServerMessage::GameSessionStarted);
}

// =========================================================================
// Protocol errors
// =========================================================================

#[tokio::test]
async fn test_protocol_errors_are_reported_and_connection_survives() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, "9,hello").await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Error(ErrorCode::UnknownSignifier));

    send(&mut ws, "not a record").await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Error(ErrorCode::Malformed));

    send(&mut ws, "1,only-a-name").await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Error(ErrorCode::Malformed));

    send(&mut ws, "4").await;
    assert_eq!(recv(&mut ws).await, ServerMessage::Error(ErrorCode::NotInSession));

    // Still served after all of that.
    send(&mut ws, "2,ann,pw").await;
    assert_eq!(recv(&mut ws).await, login_response(LoginResult::Success));
}

// =========================================================================
// Configuration
// =========================================================================

#[tokio::test]
async fn test_utf8_replies_are_text_frames() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(&addr).await;

    send(&mut ws, "2,ann,pw1").await;

    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply within 2s")
        .unwrap()
        .unwrap();
    match frame {
        Message::Text(text) => assert_eq!(text.as_str(), "1,1"),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_utf16_replies_are_binary_frames() {
    let addr = start_server(ServerConfig {
        encoding: Encoding::Utf16,
        ..test_config()
    })
    .await;
    let mut ws = connect(&addr).await;

    let request = Utf16Codec.encode(&ClientMessage::AddToGameSessionQueue);
    ws.send(Message::Binary(request.into())).await.unwrap();
    let mut other = connect(&addr).await;
    other
        .send(Message::Binary(Utf16Codec.encode(&ClientMessage::AddToGameSessionQueue).into()))
        .await
        .unwrap();

    let frame = ws.next().await.unwrap().unwrap();
    assert!(matches!(frame, Message::Binary(_)));
}

#[tokio::test]
async fn test_utf16_encoding() {
    let addr = start_server(ServerConfig {
        encoding: Encoding::Utf16,
        ..test_config()
    })
    .await;
    let mut ws = connect(&addr).await;

    let request = Utf16Codec.encode(&ClientMessage::CreateAccount {
        name: "ann".into(),
        password: "pw1".into(),
    });
    ws.send(Message::Binary(request.into())).await.unwrap();

    let reply = ws.next().await.unwrap().unwrap().into_data();
    let decoded: ServerMessage = Utf16Codec.decode(&reply).unwrap();
    assert_eq!(decoded, login_response(LoginResult::Success));
}

#[tokio::test]
async fn test_connection_limit_refuses_extra_connections() {
    let addr = start_server(ServerConfig {
        max_connections: 1,
        ..test_config()
    })
    .await;
    let mut first = connect(&addr).await;
    settle().await;

    let mut second = connect(&addr).await;
    // The server closes the extra connection straight away.
    let next = tokio::time::timeout(Duration::from_secs(2), second.next())
        .await
        .expect("server should act within 2s");
    assert!(matches!(next, None | Some(Ok(Message::Close(_))) | Some(Err(_))));

    // The first connection is unaffected.
    send(&mut first, "2,ann,pw").await;
    assert_eq!(recv(&mut first).await, login_response(LoginResult::Success));
}

#[tokio::test]
async fn test_run_until_stops_accepting() {
    let server = PairplayServerBuilder::new()
        .config(test_config())
        .build_with_storage(MemoryStorage::new())
        .await
        .unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(server.run_until(async {
        let _ = rx.await;
    }));

    tx.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("server should stop")
        .expect("task should not panic");
    assert!(result.is_ok());
}
