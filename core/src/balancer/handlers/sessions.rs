//! Session handlers
//! Handles /api/sessions, /api/resolve and /api/session/:session

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::collections::HashMap;

use crate::balancer::error::ApiError;
use crate::balancer::fingerprint;
use crate::balancer::server::AppState;

/// Handle GET /api/sessions
pub async fn handle_list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.sessions.list().await)
}

/// Handle GET /api/resolve
pub async fn handle_resolve(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    resolve(&state, &query, None, &headers).await
}

/// Handle GET /api/resolve/:sessionId
pub async fn handle_resolve_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    resolve(&state, &query, Some(&session_id), &headers).await
}

async fn resolve(
    state: &AppState,
    query: &HashMap<String, String>,
    route_session: Option<&str>,
    headers: &HeaderMap,
) -> Result<Json<crate::session::SessionRecord>, ApiError> {
    let fp = fingerprint::extract(query, route_session, headers);
    state
        .sessions
        .resolve(&fp)
        .await
        .map(Json)
        .ok_or(ApiError::SessionNotFound)
}

/// Handle GET /api/session/:session
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.sessions.wait_for_snapshot(&session, state.session_wait).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(ApiError::SessionTimeout),
        Err(e) => {
            tracing::debug!("Snapshot lookup for {} failed: {}", session, e);
            Err(ApiError::SessionTimeout)
        }
    }
}

/// Handle DELETE /api/session/:session
pub async fn handle_clean_session(
    State(state): State<AppState>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.sessions.clean_session(&session).await?;
    tracing::info!("Cleaned session {}", session);
    Ok(Json(json!({"status": "ok"})))
}
