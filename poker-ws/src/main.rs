use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

use poker_ws::{ws_handler, AppState, Config, InMemoryPersistence, StaticAuthProvider};

async fn health() -> &'static str {
    "ok"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let config = Config::from_env();
    let state = AppState::new(Arc::new(StaticAuthProvider), Arc::new(InMemoryPersistence::new()), config.clone());

    // No HTTP surface exists yet to create tables on demand, so a couple of
    // demo tables are seeded at startup for local runs and the bundled test
    // client to connect to.
    state.create_table("1", 9, 5, 10).await;
    state.create_table("2", 6, 25, 50).await;

    let app = Router::new()
        .route("/health", get(health))
        .route("/ws/tables/:table_id", get(ws_handler))
        .nest_service("/", ServeDir::new("public"))
        .with_state(state);

    let addr = config.bind_addr;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
