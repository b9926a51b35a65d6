//! End-to-end tests that run a real axum server on an ephemeral port and
//! drive it with tokio-tungstenite clients, the same way `bin/client.rs`
//! talks to a live deployment.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use poker_ws::{ws_handler, AppState, Config, InMemoryPersistence, StaticAuthProvider};

async fn spawn_server(config: Config) -> (SocketAddr, AppState) {
    let state = AppState::new(Arc::new(StaticAuthProvider), Arc::new(InMemoryPersistence::new()), config);
    state.create_table("1", 6, 5, 10).await;

    let app = Router::new().route("/ws/tables/:table_id", get(ws_handler)).with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr, table_id: &str, user_id: u64) -> tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>> {
    let url = format!("ws://{addr}/ws/tables/{table_id}?token={user_id}");
    let (ws, _response) = connect_async(url.as_str()).await.expect("connect");
    ws
}

async fn next_table_state(ws: &mut tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>) -> Value {
    loop {
        match ws.next().await.expect("stream ended").expect("ws error") {
            Message::Text(text) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["type"] == "table_state" {
                    return value["payload"].clone();
                }
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn heads_up_fold_awards_pot_over_the_wire() {
    let (addr, state) = spawn_server(Config::default()).await;
    state.get_table("1").await.unwrap().seat_player(1, 1000).await.unwrap();
    state.get_table("1").await.unwrap().seat_player(2, 1000).await.unwrap();

    let mut ws1 = connect(addr, "1", 1).await;
    let mut ws2 = connect(addr, "1", 2).await;
    let _ = next_table_state(&mut ws1).await;
    let _ = next_table_state(&mut ws2).await;

    // Heads-up: the non-dealer (seat 1 = user 2) posts the small blind and acts first.
    let fold = serde_json::json!({"type": "player_action", "payload": {"action": "fold", "amount": 0}});
    ws2.send(Message::Text(fold.to_string())).await.unwrap();

    let mut last = next_table_state(&mut ws1).await;
    while last["hand_active"].as_bool() != Some(false) {
        last = next_table_state(&mut ws1).await;
    }
    let total_stack: i64 = last["players"].as_array().unwrap().iter().map(|p| p["stack"].as_i64().unwrap()).sum();
    assert_eq!(total_stack, 2000);
}

#[tokio::test]
async fn toggle_show_all_is_rejected_for_seated_players() {
    let (addr, state) = spawn_server(Config::default()).await;
    state.get_table("1").await.unwrap().seat_player(1, 1000).await.unwrap();
    state.get_table("1").await.unwrap().seat_player(2, 1000).await.unwrap();

    let mut ws1 = connect(addr, "1", 1).await;
    let _ = next_table_state(&mut ws1).await;

    let toggle = serde_json::json!({"type": "toggle_show_all", "payload": {"show": true}});
    ws1.send(Message::Text(toggle.to_string())).await.unwrap();

    let reply = ws1.next().await.unwrap().unwrap();
    let Message::Text(text) = reply else { panic!("expected text frame") };
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["type"], "error");
    assert_eq!(value["code"], "spectator_only");
}

#[tokio::test]
async fn disconnect_mid_hand_forces_a_fold_and_eventually_evicts() {
    let config = Config { leave_grace: Duration::from_millis(50), next_hand_delay: Duration::from_millis(20), ..Config::default() };
    let (addr, state) = spawn_server(config).await;
    let runtime = state.get_table("1").await.unwrap();
    runtime.seat_player(1, 1000).await.unwrap();
    runtime.seat_player(2, 1000).await.unwrap();

    let mut ws1 = connect(addr, "1", 1).await;
    let ws2 = connect(addr, "1", 2).await;
    let _ = next_table_state(&mut ws1).await;

    drop(ws2);
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!runtime.is_seated(2).await);
}
