//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token on a protected route
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid identity, but not the owner of the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The id does not resolve (or resolves to another user's data)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed request fields
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Posting budget for the caller is exhausted
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Internal server error
    #[error("Internal server error")]
    Internal,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please login first.".to_string(),
            ),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
