use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalingRelay, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub relay: SignalingRelay,
    pub max_message_bytes: usize,
}

/// `/ws` for signaling, `/health` for liveness checks, and the static directory (if
/// configured) for everything else.
pub fn router(relay: SignalingRelay, config: &ServerConfig) -> Router {
    let state = AppState {
        relay,
        max_message_bytes: config.max_message_bytes,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health));

    if let Some(dir) = &config.static_dir {
        info!("Serving static files from {}", dir.display());
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors).with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

pub async fn serve(config: ServerConfig) -> Result<()> {
    let relay = SignalingRelay::new(Arc::new(RoomRegistry::new()));
    let app = router(relay, &config);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    info!("Signaling relay listening on ws://{}/ws", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Signaling relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
