//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid token
    #[error("{0}")]
    Unauthorized(String),

    /// Wrong role, or a non-owner acting on a resource
    #[error("{0}")]
    Forbidden(String),

    /// Resource absent, or owned by someone else
    #[error("{0}")]
    NotFound(String),

    /// Mutation attempt on an order in a terminal status
    #[error("{0}")]
    InvalidState(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal server error
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) | ApiError::InvalidState(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            ApiError::Internal => (
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

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
