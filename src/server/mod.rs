//! # HTTP Server for the Card Editor
//!
//! Serves the editor page and a JSON API over in-memory editor sessions.
//!
//! ## Usage
//!
//! ```bash
//! cardstock serve --listen 0.0.0.0:8080 --service-url https://templates.example.com/get-template
//! ```
//!
//! Then open `http://localhost:8080/?artNr=29009&front=29009-front&inside=inside-classic`.

mod handlers;
mod state;
mod static_files;

pub use state::{AppState, SESSION_EXPIRATION_SECS, StoredSession};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;

use crate::config::EditorConfig;
use crate::error::CardstockError;

/// Build the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Frontend
        .route("/", get(static_files::index_handler))
        .route("/assets/*path", get(static_files::asset_handler))
        // Session API
        .route("/api/sessions", post(handlers::session::create))
        .route("/api/sessions/:id", get(handlers::session::show))
        .route("/api/sessions/:id/render", get(handlers::session::render))
        .route("/api/sessions/:id/preview.svg", get(handlers::session::preview))
        .route(
            "/api/sessions/:id/selection",
            post(handlers::session::select).delete(handlers::session::clear_selection),
        )
        .route("/api/sessions/:id/click", post(handlers::session::click))
        .route("/api/sessions/:id/side", post(handlers::session::set_side))
        .route("/api/sessions/:id/bleed", post(handlers::session::toggle_bleed))
        .route(
            "/api/sessions/:id/elements/:element/text",
            post(handlers::session::update_text),
        )
        .route(
            "/api/sessions/:id/elements/:element/lock",
            post(handlers::session::toggle_lock),
        )
        .route(
            "/api/sessions/:id/inside-layout",
            post(handlers::session::swap_inside_layout),
        )
        .route("/api/sessions/:id/save", post(handlers::session::save))
        // Templates
        .route("/api/templates/bundled", get(handlers::templates::bundled))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use cardstock::{config::EditorConfig, server::serve};
///
/// # async fn example() -> Result<(), cardstock::error::CardstockError> {
/// serve(EditorConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: EditorConfig) -> Result<(), CardstockError> {
    let app_state = Arc::new(AppState::new(config.clone())?);

    // Spawn background session cleanup task
    tokio::spawn(cleanup_sessions(app_state.clone()));

    let app = router(app_state);

    log::info!("Cardstock editor server starting...");
    log::info!("Listening on: {}", config.listen_addr);
    log::info!("Template service: {}", config.service_url);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            CardstockError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| CardstockError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop idle editor sessions.
async fn cleanup_sessions(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(SESSION_EXPIRATION_SECS);

    loop {
        interval.tick().await;
        let now = Instant::now();

        let mut sessions = state.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, v| now.duration_since(v.last_accessed) < expiration);
        let after = sessions.len();
        if before != after {
            log::info!(
                "[sessions] Cleaned up {} expired editor sessions ({} remaining)",
                before - after,
                after
            );
        }
    }
}
