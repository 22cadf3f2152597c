use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("Upstream API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Session(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            Self::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error occurred".to_string())
            }
            Self::HttpRequest(ref e) => {
                tracing::error!("HTTP request error: {}", e);
                (StatusCode::BAD_GATEWAY, "External service request failed".to_string())
            }
            Self::Serialization(ref e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Data processing error".to_string())
            }
            Self::Validation(ref msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized(ref msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(ref msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::UpstreamAuth(ref msg) => {
                tracing::error!("Upstream authentication failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Catalog authentication failed".to_string())
            }
            Self::Upstream { status, ref message } => {
                tracing::error!("Upstream API error ({}): {}", status, message);
                (
                    StatusCode::BAD_GATEWAY,
                    format!("Catalog request failed (upstream status {}): {}", status, message),
                )
            }
            Self::Session(ref e) => {
                tracing::error!("Session error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Session error occurred".to_string())
            }
            Self::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred".to_string())
            }
            Self::Other(ref e) => {
                tracing::error!("Unexpected error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "An unexpected error occurred".to_string())
            }
        };

        // Diagnostic details are for local development only
        #[cfg(debug_assertions)]
        let body = Json(json!({
            "error": error_message,
            "details": self.to_string(),
        }));

        #[cfg(not(debug_assertions))]
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
