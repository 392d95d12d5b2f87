//! Generation provider configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::GenerationError;

/// Default bound on a single generation call.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Supported text-generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "learnlm-2.0-flash-experimental",
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "llama3.1",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Ollama => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(GenerationError::Config(format!(
                "unsupported provider: {other}"
            ))),
        }
    }
}

/// Resolved configuration for the itinerary generation backend.
#[derive(Clone)]
pub struct GenerationConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GenerationConfig {
    /// Defaults for a provider, without an API key.
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key: None,
            base_url: provider.default_base_url().to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                 | Default                                       |
    /// |--------------------------|-----------------------------------------------|
    /// | `ITINERARY_PROVIDER`     | `gemini` if `GEMINI_API_KEY` set, else `openai` if `OPENAI_API_KEY` set, else `ollama` |
    /// | `ITINERARY_MODEL`        | provider default                              |
    /// | `ITINERARY_BASE_URL`     | provider default (`OLLAMA_BASE_URL` for ollama) |
    /// | `ITINERARY_TIMEOUT_SECS` | `60`                                          |
    pub fn from_env() -> Result<Self, GenerationError> {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());

        let provider = match non_empty("ITINERARY_PROVIDER") {
            Some(p) => p.parse()?,
            None if non_empty("GEMINI_API_KEY").is_some() => ProviderKind::Gemini,
            None if non_empty("OPENAI_API_KEY").is_some() => ProviderKind::OpenAi,
            None => ProviderKind::Ollama,
        };

        let mut config = Self::for_provider(provider);
        if let Some(model) = non_empty("ITINERARY_MODEL") {
            config.model = model;
        }
        config.api_key = provider.api_key_env().and_then(non_empty);

        let base_url = non_empty("ITINERARY_BASE_URL").or_else(|| match provider {
            ProviderKind::Ollama => non_empty("OLLAMA_BASE_URL"),
            _ => None,
        });
        if let Some(url) = base_url {
            config.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = non_empty("ITINERARY_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                GenerationError::Config(format!("invalid ITINERARY_TIMEOUT_SECS: {raw}"))
            })?;
            config.timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }

    /// API key for providers that need one.
    pub fn require_api_key(&self) -> Result<&str, GenerationError> {
        self.api_key.as_deref().ok_or_else(|| {
            GenerationError::Config(format!(
                "{} is required for the {} provider",
                self.provider.api_key_env().unwrap_or("an API key"),
                self.provider
            ))
        })
    }
}
