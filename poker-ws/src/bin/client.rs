use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// Minimal test client: connects to one table as one user and either sits
/// watching state frames, or submits a single action before watching.
///
/// Usage: client <table_id> <user_id> [action] [amount]
#[tokio::main]
async fn main() {
    let table_id = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());
    let user_id = std::env::args().nth(2).unwrap_or_else(|| "1".to_string());
    let action = std::env::args().nth(3);
    let amount = std::env::args().nth(4).unwrap_or_else(|| "0".to_string());

    let url = format!("ws://127.0.0.1:8080/ws/tables/{table_id}?token={user_id}");
    let (mut ws, _response) = connect_async(url.as_str()).await.expect("connect to poker-ws");

    if let Some(action) = action {
        let amount: i64 = amount.parse().unwrap_or(0);
        let payload = serde_json::json!({
            "type": "player_action",
            "payload": {"action": action, "amount": amount},
        });
        ws.send(Message::Text(payload.to_string())).await.expect("send action");
    }

    while let Some(frame) = ws.next().await {
        match frame {
            Ok(Message::Text(text)) => println!("<- {text}"),
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }
}
