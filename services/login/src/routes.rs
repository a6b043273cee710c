//! Login service routes

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::token::TokenError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::{
    AppState,
    credentials::CredentialError,
    validation::{validate_password, validate_username},
};

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Response for a successful login
#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Create the router for the login service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/login", post(login))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "login-service"
    }))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AuthError>,
) -> Result<impl IntoResponse, AuthError> {
    validate_username(&payload.username).map_err(AuthError::InvalidRequest)?;
    validate_password(&payload.password).map_err(AuthError::InvalidRequest)?;

    info!("Login attempt for user: {}", payload.username);

    match state
        .credential_validator
        .validate(&payload.username, &payload.password)
        .await
    {
        Ok(()) => {}
        Err(CredentialError::Rejected) => {
            info!("Invalid credentials for user: {}", payload.username);
            return Err(AuthError::InvalidCredentials);
        }
        Err(CredentialError::Store(e)) => {
            error!("Failed to read credential secret: {}", e);
            return Err(if e.is_transient() {
                AuthError::ServiceUnavailable
            } else {
                AuthError::InternalServerError
            });
        }
    }

    let issued = state.token_service.issue(&payload.username).await?;

    let response = LoginResponse {
        username: payload.username,
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Service temporarily unavailable")]
    ServiceUnavailable,

    #[error("Internal server error")]
    InternalServerError,
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidRequest(rejection.body_text())
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        error!("Failed to issue token: {}", err);
        match err {
            TokenError::Store(e) if e.is_transient() => AuthError::ServiceUnavailable,
            _ => AuthError::InternalServerError,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
