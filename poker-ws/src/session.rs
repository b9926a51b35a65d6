use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::error::SessionError;
use crate::runtime::TableRuntime;
use crate::snapshot::TableSnapshot;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    ToggleShowAll { payload: ToggleShowAllPayload },
    PlayerAction { payload: PlayerActionPayload },
}

#[derive(Debug, Deserialize)]
struct ToggleShowAllPayload {
    show: bool,
}

#[derive(Debug, Deserialize)]
struct PlayerActionPayload {
    action: String,
    #[serde(default)]
    amount: i64,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    TableState { payload: TableSnapshot },
    Error { code: &'static str, message: String },
}

/// Drives one client's websocket connection against `runtime` on behalf of
/// `user_id`, for as long as the socket stays open. Outgoing frames (state
/// broadcasts and direct error replies) are funneled through one mpsc
/// channel into a single writer task, so a slow client can't block the
/// table lock held by a broadcast to other sessions.
pub async fn handle_socket(socket: WebSocket, runtime: Arc<TableRuntime>, user_id: u64) {
    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    let (conn_id, mut snapshots) = runtime.register(user_id).await;

    let bridge_tx = out_tx.clone();
    let bridge = tokio::spawn(async move {
        while let Some(snapshot) = snapshots.recv().await {
            if bridge_tx.send(ServerMessage::TableState { payload: snapshot }).is_err() {
                break;
            }
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(message) = out_rx.recv().await {
            let text = serde_json::to_string(&message).expect("ServerMessage always serializes");
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    runtime.broadcast_state().await;

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else { continue };
        if let Err(err) = dispatch(&runtime, conn_id, user_id, &text).await {
            let _ = out_tx.send(ServerMessage::Error { code: err.code(), message: err.to_string() });
        }
    }

    runtime.unregister(conn_id).await;
    bridge.abort();
    writer.abort();
    info!(user_id, table_id = runtime.table_id(), "session closed");
}

async fn dispatch(runtime: &Arc<TableRuntime>, conn_id: u64, user_id: u64, raw: &str) -> Result<(), SessionError> {
    let message: ClientMessage = serde_json::from_str(raw).map_err(|_| SessionError::InvalidJson)?;

    match message {
        ClientMessage::ToggleShowAll { payload } => {
            if !runtime.is_spectator(user_id).await {
                return Err(SessionError::SpectatorOnly);
            }
            runtime.set_show_all(conn_id, payload.show).await;
            runtime.broadcast_state().await;
            Ok(())
        }
        ClientMessage::PlayerAction { payload } => {
            if runtime.is_spectator(user_id).await {
                return Err(SessionError::SpectatorCannotAct);
            }
            if !runtime.is_seated(user_id).await {
                return Err(SessionError::PlayerNotSeated);
            }
            let action: texas_engine::PlayerAction =
                serde_json::from_value(serde_json::Value::String(payload.action))
                    .map_err(|_| SessionError::InvalidAction)?;

            if !runtime.is_hand_active().await {
                runtime.start_hand().await.map_err(SessionError::StartHandFailed)?;
            }
            runtime
                .apply_action(user_id, action, payload.amount)
                .await
                .map_err(SessionError::ActionFailed)?;

            runtime.broadcast_state().await;
            if !runtime.is_hand_active().await {
                runtime.schedule_next_hand().await;
            }
            Ok(())
        }
    }
}
