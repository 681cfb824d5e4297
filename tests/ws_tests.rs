//! End-to-end game sessions over a real WebSocket connection.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use wire_game_server::app::AppState;
use wire_game_server::config::Config;
use wire_game_server::http::build_router;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(Config {
        static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"),
        ..config
    });
    let router = build_router(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (addr, state)
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = tokio_test::assert_ok!(connect_async(format!("ws://{addr}/ws")).await);
    client
}

async fn send(client: &mut Client, frame: Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn recv(client: &mut Client) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for frame")
        .unwrap()
        .unwrap();
    match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

fn state(x: f64, y: f64, started: bool, game_over: bool) -> Value {
    json!({
        "event": "state",
        "data": {"x": x, "y": y, "started": started, "gameOver": game_over}
    })
}

#[tokio::test]
async fn initial_state_is_sent_on_connect() {
    let (addr, _) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;

    assert_eq!(recv(&mut client).await, state(60.0, 225.0, false, false));
}

#[tokio::test]
async fn full_game_flow() {
    let (addr, _) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    send(&mut client, json!({"event": "start"})).await;
    assert_eq!(recv(&mut client).await, state(60.0, 225.0, true, false));

    send(&mut client, json!({"event": "move", "data": {"dx": 1, "dy": 0}})).await;
    assert_eq!(recv(&mut client).await, state(63.0, 225.0, true, false));

    send(&mut client, json!({"event": "move", "data": {"dx": 0, "dy": 3}})).await;
    assert_eq!(recv(&mut client).await, state(63.0, 234.0, true, true));

    send(&mut client, json!({"event": "restart"})).await;
    assert_eq!(recv(&mut client).await, state(60.0, 225.0, false, false));
}

#[tokio::test]
async fn ignored_events_produce_no_reply() {
    let (addr, _) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    // Neither of these emits while idle, so the next frame answers the restart
    send(&mut client, json!({"event": "move", "data": {"dx": 1, "dy": 1}})).await;
    send(&mut client, json!({"event": "release"})).await;
    send(&mut client, json!({"event": "restart"})).await;

    assert_eq!(recv(&mut client).await, state(60.0, 225.0, false, false));
}

#[tokio::test]
async fn malformed_move_is_rejected_without_state_change() {
    let (addr, _) = spawn_server(Config::default()).await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    send(&mut client, json!({"event": "start"})).await;
    recv(&mut client).await;

    send(&mut client, json!({"event": "move", "data": {"dx": 1}})).await;
    let reply = recv(&mut client).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["data"]["code"], "malformed");

    send(&mut client, json!({"event": "move", "data": {"dx": 0, "dy": 0}})).await;
    assert_eq!(recv(&mut client).await, state(60.0, 225.0, true, false));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let (addr, _) = spawn_server(Config::default()).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    recv(&mut first).await;
    recv(&mut second).await;

    send(&mut first, json!({"event": "start"})).await;
    recv(&mut first).await;
    send(&mut first, json!({"event": "release"})).await;
    assert_eq!(recv(&mut first).await, state(60.0, 225.0, true, true));

    // The second client never started, so release is still a no-op there
    send(&mut second, json!({"event": "release"})).await;
    send(&mut second, json!({"event": "start"})).await;
    assert_eq!(recv(&mut second).await, state(60.0, 225.0, true, false));
}

#[tokio::test]
async fn session_cap_rejects_extra_connections() {
    let (addr, state) = spawn_server(Config {
        max_sessions: 1,
        ..Config::default()
    })
    .await;

    let mut first = connect(addr).await;
    recv(&mut first).await;
    assert_eq!(state.sessions.active_sessions(), 1);

    match connect_async(format!("ws://{addr}/ws")).await {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 503),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("second session should have been rejected"),
    }
}

#[tokio::test]
async fn control_events_bypass_move_rate_limit() {
    let (addr, _) = spawn_server(Config {
        input_rate_limit: 2,
        ..Config::default()
    })
    .await;
    let mut client = connect(addr).await;
    recv(&mut client).await;

    send(&mut client, json!({"event": "start"})).await;
    assert_eq!(recv(&mut client).await, state(60.0, 225.0, true, false));

    for _ in 0..10 {
        send(&mut client, json!({"event": "move", "data": {"dx": 1, "dy": 0}})).await;
    }
    send(&mut client, json!({"event": "release"})).await;

    // Some moves are throttled; the release must still land
    let mut replies = 0;
    loop {
        let reply = recv(&mut client).await;
        assert_eq!(reply["event"], "state");
        replies += 1;
        if reply["data"]["gameOver"] == true {
            assert_eq!(reply["data"]["started"], true);
            break;
        }
    }
    assert!(replies < 11, "throttled moves should not all be applied");

    send(&mut client, json!({"event": "restart"})).await;
    assert_eq!(recv(&mut client).await, state(60.0, 225.0, false, false));
}
