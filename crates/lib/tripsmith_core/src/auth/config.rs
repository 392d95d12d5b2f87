//! Session configuration: signing secrets and token lifetimes.

use std::path::{Path, PathBuf};

use chrono::Duration;
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;

/// Default access token lifetime.
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: &str = "15m";

/// Default refresh token lifetime.
pub const DEFAULT_REFRESH_TOKEN_EXPIRY: &str = "10d";

/// Upper bound on either token lifetime, in days.
pub const MAX_TOKEN_EXPIRY_DAYS: i64 = 3650;

/// Secrets and lifetimes for the two token kinds.
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl AuthConfig {
    /// Build a config, rejecting empty or shared secrets.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        let config = Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl,
            refresh_ttl,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable               | Default                          |
    /// |------------------------|----------------------------------|
    /// | `ACCESS_TOKEN_SECRET`  | generated & persisted to file    |
    /// | `REFRESH_TOKEN_SECRET` | generated & persisted to file    |
    /// | `ACCESS_TOKEN_EXPIRY`  | `15m`                            |
    /// | `REFRESH_TOKEN_EXPIRY` | `10d`                            |
    pub fn from_env() -> Result<Self, AuthError> {
        let access_ttl = parse_expiry(
            &std::env::var("ACCESS_TOKEN_EXPIRY")
                .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_EXPIRY.into()),
        )?;
        let refresh_ttl = parse_expiry(
            &std::env::var("REFRESH_TOKEN_EXPIRY")
                .unwrap_or_else(|_| DEFAULT_REFRESH_TOKEN_EXPIRY.into()),
        )?;
        Self::new(
            resolve_secret("ACCESS_TOKEN_SECRET", &secret_path("access-token-secret")),
            resolve_secret("REFRESH_TOKEN_SECRET", &secret_path("refresh-token-secret")),
            access_ttl,
            refresh_ttl,
        )
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            return Err(AuthError::Internal("token secrets must not be empty".into()));
        }
        if self.access_secret == self.refresh_secret {
            return Err(AuthError::Internal(
                "access and refresh token secrets must differ".into(),
            ));
        }
        if self.access_ttl <= Duration::zero() || self.refresh_ttl <= Duration::zero() {
            return Err(AuthError::Internal("token lifetimes must be positive".into()));
        }
        if self.access_ttl > max_ttl() || self.refresh_ttl > max_ttl() {
            return Err(AuthError::Internal(format!(
                "token lifetimes must not exceed {MAX_TOKEN_EXPIRY_DAYS} days"
            )));
        }
        Ok(())
    }
}

/// Parse an expiry such as `900`, `15m`, `12h` or `10d`. A bare number is seconds.
pub fn parse_expiry(raw: &str) -> Result<Duration, AuthError> {
    let raw = raw.trim();
    let invalid = || AuthError::Internal(format!("invalid token expiry: {raw:?}"));

    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };
    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    let ttl = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    };
    ttl.filter(|d| *d <= max_ttl()).ok_or_else(invalid)
}

/// Longest accepted token lifetime.
fn max_ttl() -> Duration {
    Duration::days(MAX_TOKEN_EXPIRY_DAYS)
}

/// Resolve a signing secret: env var → persisted file → freshly generated
/// (and persisted, so restarts keep issued tokens valid).
pub fn resolve_secret(env_var: &str, path: &Path) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, &secret);
    info!(path = %path.display(), env_var, "generated new token secret");
    secret
}

fn secret_path(file: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tripsmith")
        .join(file)
}
