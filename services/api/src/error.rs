//! Custom error types for the API service

use access::{LoadError, StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::BackendError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed
    #[error("Forbidden")]
    Forbidden,

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Unknown resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflicting or concurrent change
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Staff member {} not found", id)),
            StoreError::UnknownRole(_)
            | StoreError::UnknownFeature(_)
            | StoreError::Validation(_) => ApiError::BadRequest(e.to_string()),
            StoreError::DuplicateEmail(_)
            | StoreError::MutationInFlight(_)
            | StoreError::Superseded => ApiError::Conflict(e.to_string()),
            StoreError::Backend(BackendError::NotFound(what)) => ApiError::NotFound(what),
            StoreError::Backend(e) => {
                error!("Backend failure: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<LoadError> for ApiError {
    fn from(e: LoadError) -> Self {
        error!("Failed to load permissions: {}", e);
        ApiError::InternalServerError
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use access::models::StaffId;

    #[test]
    fn test_store_errors_map_to_status_codes() {
        let cases = [
            (StoreError::NotFound(StaffId::from("x")), StatusCode::NOT_FOUND),
            (StoreError::UnknownRole("wizard".into()), StatusCode::BAD_REQUEST),
            (StoreError::MutationInFlight("x".into()), StatusCode::CONFLICT),
            (StoreError::DuplicateEmail("a@b.edu".into()), StatusCode::CONFLICT),
            (
                StoreError::Backend(BackendError::Transport("reset".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).into_response().status(), status);
        }
    }
}
