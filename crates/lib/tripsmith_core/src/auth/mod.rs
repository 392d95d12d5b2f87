//! Authentication and session lifecycle.
//!
//! Password hashing, token issuance, the single-token session registry and
//! the login/refresh/logout orchestration that ties them together.

pub mod config;
pub mod jwt;
pub mod password;
pub mod service;
pub mod session;

use thiserror::Error;

use crate::store::StoreError;

pub use config::AuthConfig;
pub use jwt::{TokenIssuer, TokenKind};
pub use service::AuthSessionService;
pub use session::SessionRegistry;

/// Authentication errors. Each auth kind maps to its own response upstream.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Refresh token missing")]
    MissingToken,

    /// Bad signature, malformed or expired; deliberately indistinguishable.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Well-formed refresh token that is not the one currently on record.
    #[error("Refresh token is expired or already used")]
    TokenMismatch,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
