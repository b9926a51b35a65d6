//! Table runtime, session layer and ambient wiring for the websocket poker
//! server. Game rules themselves live in `texas_engine`; this crate owns
//! concurrency, persistence, auth, and the wire protocol on top of it.

pub mod auth;
pub mod config;
pub mod error;
pub mod persistence;
pub mod runtime;
pub mod session;
pub mod snapshot;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use texas_engine::Table;

pub use auth::{AuthError, AuthProvider, StaticAuthProvider};
pub use config::Config;
pub use error::SessionError;
pub use persistence::{InMemoryPersistence, PersistenceAdapter};
pub use runtime::TableRuntime;

/// Process-wide shared state: the table registry plus the auth/persistence
/// collaborators every connection needs. Cheap to clone (everything behind
/// an `Arc`), matching axum's `State` extractor expectations.
#[derive(Clone)]
pub struct AppState {
    pub tables: Arc<Mutex<HashMap<String, Arc<TableRuntime>>>>,
    pub auth: Arc<dyn AuthProvider>,
    pub persistence: Arc<dyn PersistenceAdapter>,
    pub config: Config,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthProvider>, persistence: Arc<dyn PersistenceAdapter>, config: Config) -> Self {
        AppState { tables: Arc::new(Mutex::new(HashMap::new())), auth, persistence, config }
    }

    /// Registers a brand-new table under `table_id`, replacing nothing if
    /// one already exists under that id. Table creation/listing is the HTTP
    /// surface's job in a full deployment; this is the minimal seam this
    /// crate needs to have something to connect to.
    pub async fn create_table(&self, table_id: impl Into<String>, max_players: usize, small_blind: i64, big_blind: i64) {
        let table_id = table_id.into();
        let runtime = TableRuntime::new(
            table_id.clone(),
            Table::new(max_players, small_blind, big_blind),
            self.config.clone(),
            self.persistence.clone(),
        );
        self.tables.lock().await.insert(table_id, runtime);
    }

    pub async fn get_table(&self, table_id: &str) -> Option<Arc<TableRuntime>> {
        self.tables.lock().await.get(table_id).cloned()
    }
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

#[derive(Serialize)]
struct RejectMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    code: &'static str,
    message: String,
}

async fn reject(mut socket: WebSocket, code: &'static str, message: impl Into<String>) {
    let frame = RejectMessage { kind: "error", code, message: message.into() };
    let text = serde_json::to_string(&frame).expect("RejectMessage always serializes");
    let _ = socket.send(Message::Text(text)).await;
    let _ = socket.close().await;
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(table_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        let Some(token) = query.token else {
            warn!(table_id, "connection rejected: missing token");
            reject(socket, "missing_token", "missing token").await;
            return;
        };
        let user_id = match state.auth.verify(&token) {
            Ok(id) => id,
            Err(_) => {
                warn!(table_id, "connection rejected: invalid token");
                reject(socket, "invalid_token", "invalid token").await;
                return;
            }
        };
        let Some(runtime) = state.get_table(&table_id).await else {
            warn!(table_id, user_id, "connection rejected: table not found");
            reject(socket, "table_not_found", "table not found").await;
            return;
        };
        session::handle_socket(socket, runtime, user_id).await;
    })
}
