//! Transcoder argument submission
//! Handles POST /api/ffmpeg

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::IntoResponse,
};
use serde::Deserialize;
use std::collections::HashMap;

use crate::balancer::error::ApiError;
use crate::balancer::server::AppState;

/// Body: `{"arg": [...], "env": {...}}`
#[derive(Debug, Deserialize)]
pub struct FfmpegRequest {
    pub arg: Vec<String>,
    pub env: HashMap<String, String>,
}

/// Handle POST /api/ffmpeg
pub async fn handle_ffmpeg(
    State(state): State<AppState>,
    body: Result<Json<FfmpegRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|e| {
        tracing::warn!("Rejected transcoder submission: {}", e);
        ApiError::InvalidArguments
    })?;

    let parsed = state
        .sessions
        .store_ffmpeg_parameters(&request.arg, request.env)
        .await
        .map_err(|e| {
            tracing::warn!("Rejected transcoder submission: {}", e);
            ApiError::InvalidArguments
        })?;

    tracing::info!("Transcoder registered for session {} ({})", parsed.session, parsed.session_full);
    Ok(Json(parsed))
}
