//! API error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orgpress_shared::PressError;
use serde_json::json;

use crate::{auth::JwtError, directory::DirectoryError, store::StoreError};

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // Authentication errors
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Authentication required")]
    Unauthorized,
    #[error("You are not a member of this organization")]
    NotAMember,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("{0} not found")]
    NotFound(&'static str),

    // Upstream errors
    #[error("Organization directory unavailable")]
    DirectoryUnavailable,

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidToken | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotAMember => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DirectoryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::NotAMember => "NOT_A_MEMBER",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::DirectoryUnavailable => "DIRECTORY_UNAVAILABLE",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Validation(msg) => msg.clone(),
            // Never leak driver details to clients
            ApiError::Database(_) => "Database error".to_string(),
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
            }
        }));

        (self.status(), body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::Database(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => e.into(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        tracing::error!(error = %err, "Directory request failed");
        ApiError::DirectoryUnavailable
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Encoding(_) => ApiError::Internal,
            _ => ApiError::InvalidToken,
        }
    }
}

impl From<PressError> for ApiError {
    fn from(err: PressError) -> Self {
        match err {
            PressError::Validation(msg) => ApiError::Validation(msg),
        }
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
