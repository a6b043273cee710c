//! Authentication middleware for session token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::warn;

use crate::{error::ApiError, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// Authentication middleware
///
/// Requires `Authorization: Bearer <token>`. The owner of every task
/// operation comes from the verified token, never from the request body or
/// query string.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(authorization) = bearer.ok_or(ApiError::Unauthorized)?;

    // Validate the token
    let claims = state
        .token_service
        .verify(authorization.token())
        .await
        .map_err(|e| {
            warn!("Failed to validate token: {}", e);
            ApiError::from(e)
        })?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(AuthUser {
        username: claims.username,
    });

    Ok(next.run(req).await)
}
