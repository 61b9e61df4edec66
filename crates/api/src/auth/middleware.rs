//! Authentication middleware
//!
//! Extracts the session token from the `Authorization: Bearer` header or the
//! `__session` cookie, validates it and injects [`AuthUser`] into the request
//! extensions.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use orgpress_shared::UserId;
use serde::Serialize;
use std::sync::Arc;

use super::jwt::JwtManager;
use crate::error::ApiError;

/// Cookie set by the identity provider's frontend SDK
pub const SESSION_COOKIE: &str = "__session";

/// State needed by the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub jwt_manager: Arc<JwtManager>,
}

impl AuthState {
    pub fn new(jwt_manager: Arc<JwtManager>) -> Self {
        Self { jwt_manager }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: UserId,
    pub session_id: Option<String>,
}

/// Reject requests without a valid session token
pub async fn require_auth(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers()).ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_manager
        .validate_session_token(&token)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            ApiError::from(e)
        })?;

    let auth_user = AuthUser {
        user_id: claims.user_id(),
        session_id: claims.sid,
    };
    tracing::trace!(user_id = %auth_user.user_id, "Authenticated request");

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Bearer token first (API clients), then the session cookie (browsers)
fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
