//! API server configuration.

use tripsmith_core::auth::{AuthConfig, AuthError};
use tripsmith_core::itinerary::{GenerationConfig, GenerationError};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// Token secrets and lifetimes.
    pub auth: AuthConfig,
    /// Itinerary generation backend.
    pub generation: GenerationConfig,
    /// Whether auth cookies carry the `Secure` attribute.
    pub secure_cookies: bool,
}

/// Startup configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("auth config: {0}")]
    Auth(#[from] AuthError),

    #[error("generation config: {0}")]
    Generation(#[from] GenerationError),
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable        | Default          |
    /// |-----------------|------------------|
    /// | `BIND_ADDR`     | `127.0.0.1:3100` |
    /// | `COOKIE_SECURE` | `true`           |
    ///
    /// Token and provider settings come from [`AuthConfig::from_env`] and
    /// [`GenerationConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            auth: AuthConfig::from_env()?,
            generation: GenerationConfig::from_env()?,
            secure_cookies: std::env::var("COOKIE_SECURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}
