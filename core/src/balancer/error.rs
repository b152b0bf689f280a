//! API errors rendered as `{"error": {"code", "message"}}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid UnicornFFMPEG parameters")]
    InvalidArguments,

    #[error("The session wasn't launched in time, request fails")]
    SessionTimeout,

    #[error("No session matches this request")]
    SessionNotFound,

    #[error("Session store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArguments => "INVALID_ARGUMENTS",
            Self::SessionTimeout => "SESSION_TIMEOUT",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArguments | Self::SessionTimeout => StatusCode::BAD_REQUEST,
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}
