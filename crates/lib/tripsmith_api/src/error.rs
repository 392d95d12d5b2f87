//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use tripsmith_core::auth::AuthError;
use tripsmith_core::itinerary::GenerationError;
use tripsmith_core::store::StoreError;
use tripsmith_core::trips::TripError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// 401 with a code naming the auth failure kind.
    #[error("Unauthorized: {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Upstream failure: {0}")]
    BadGateway(String),

    #[error("Upstream timeout: {0}")]
    GatewayTimeout(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        AppError::Unauthorized {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, *code, message.as_str())
            }
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.as_str()),
            AppError::BadGateway(m) => (StatusCode::BAD_GATEWAY, "generation_failed", m.as_str()),
            AppError::GatewayTimeout(m) => {
                (StatusCode::GATEWAY_TIMEOUT, "generation_timeout", m.as_str())
            }
            AppError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(m) => AppError::NotFound(m),
            StoreError::Conflict(m) => AppError::Conflict(m),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                AppError::unauthorized("invalid_credentials", "Invalid email or password")
            }
            AuthError::MissingToken => {
                AppError::unauthorized("missing_token", "Refresh token missing")
            }
            AuthError::InvalidToken => {
                AppError::unauthorized("invalid_token", "Invalid or expired token")
            }
            AuthError::TokenMismatch => AppError::unauthorized(
                "token_mismatch",
                "Refresh token is expired or already used",
            ),
            AuthError::Unauthorized => AppError::unauthorized("unauthorized", "Unauthorized"),
            AuthError::Validation(m) => AppError::Validation(m),
            AuthError::EmailTaken => AppError::Conflict("Email already registered".into()),
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(m) => AppError::Internal(m),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Timeout(_) => AppError::GatewayTimeout(e.to_string()),
            GenerationError::UnparsableResponse(_) | GenerationError::CapabilityFailure(_) => {
                AppError::BadGateway(e.to_string())
            }
            GenerationError::Config(m) => AppError::Internal(m),
            GenerationError::Persistence(e) => AppError::from(e),
        }
    }
}

impl From<TripError> for AppError {
    fn from(e: TripError) -> Self {
        match e {
            TripError::Validation(v) => AppError::Validation(v.0),
            TripError::NotFound => AppError::NotFound("Trip not found".into()),
            TripError::Forbidden => {
                AppError::Forbidden("Not authorized to access this trip".into())
            }
            TripError::GenerationInFlight => AppError::Conflict(e.to_string()),
            TripError::Store(e) => AppError::from(e),
            TripError::Generation(e) => AppError::from(e),
        }
    }
}
