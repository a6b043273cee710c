//! Custom error types for the task service

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::{error::StoreError, token::TokenError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::TaskError;

/// Custom error type for the task service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing, invalid or expired session token
    #[error("Invalid or expired token")]
    Unauthorized,

    /// An upstream store failed or timed out
    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!("Storage error: {}", err);
        if err.is_transient() {
            ApiError::ServiceUnavailable
        } else {
            ApiError::InternalServerError
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid(_) => ApiError::Unauthorized,
            TokenError::Store(e) => e.into(),
            TokenError::Signing(e) => {
                error!("Token error: {}", e);
                ApiError::InternalServerError
            }
        }
    }
}

impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::Invalid(msg) => ApiError::InvalidRequest(msg),
            TaskError::Corrupt(row) => {
                error!("Stored task {} is malformed", row);
                ApiError::InternalServerError
            }
            TaskError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
