//! Balancer Server - Axum HTTP server

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::balancer::handlers;
use crate::session::SessionsManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionsManager>,
    /// How long `GET /api/session/:session` waits for a snapshot
    pub session_wait: Duration,
}

/// Balancer server instance
pub struct BalancerServer {
    host: String,
    port: u16,
    state: AppState,
}

impl BalancerServer {
    pub fn new(host: String, port: u16, sessions: Arc<SessionsManager>, session_wait: Duration) -> Self {
        let state = AppState { sessions, session_wait };
        Self { host, port, state }
    }

    /// Run the balancer server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let app = router(self.state);

        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Balancer listening on {}", addr);

        // Handle graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Balancer stopped");
        Ok(())
    }
}

/// Routing table
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/healthz", get(health_check_handler))
        .route("/health", get(health_check_handler))

        // Session correlation
        .route("/api/sessions", get(handlers::sessions::handle_list_sessions))
        .route("/api/resolve", get(handlers::sessions::handle_resolve))
        .route("/api/resolve/:sessionId", get(handlers::sessions::handle_resolve_session))
        .route(
            "/api/session/:session",
            get(handlers::sessions::handle_get_session).delete(handlers::sessions::handle_clean_session),
        )

        // Transcoder submissions
        .route("/api/ffmpeg", post(handlers::ffmpeg::handle_ffmpeg))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_check_handler() -> Response {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
