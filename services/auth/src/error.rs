//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the authentication service
#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing or malformed request fields
    #[error("{0}")]
    BadRequest(String),

    /// Unknown principal or wrong credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Email already registered under any principal kind
    #[error("{0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AuthError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong".to_string(),
            ),
        };

        // 4xx responses report "fail", 5xx report "error"
        let envelope = if status.is_client_error() {
            "fail"
        } else {
            "error"
        };

        let body = Json(json!({
            "status": envelope,
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for authentication results
pub type AuthResult<T> = Result<T, AuthError>;
