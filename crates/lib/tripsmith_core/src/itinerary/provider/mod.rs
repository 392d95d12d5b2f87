//! Text-generation providers.
//!
//! The pipeline only needs "free text in, free text out"; each provider
//! adapts that contract to its HTTP API.

pub mod gemini;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::time::{Duration, sleep};
use tracing::debug;

use super::GenerationError;
use super::config::{GenerationConfig, ProviderKind};

const MAX_RETRY_ATTEMPTS: u32 = 3;

/// External text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Single blocking-shaped call: prompt in, reply text out.
    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the configured provider.
pub fn from_config(config: &GenerationConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let client = Client::new();
    Ok(match config.provider {
        ProviderKind::Gemini => Arc::new(gemini::GeminiGenerator::new(client, config)?),
        ProviderKind::OpenAi => Arc::new(openai::OpenAiGenerator::new(client, config)?),
        ProviderKind::Ollama => Arc::new(ollama::OllamaGenerator::new(client, config)),
    })
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Send a request built by `build`, retrying transport errors, 429 and 5xx
/// with exponential backoff, and decode the JSON body.
async fn send_json_with_retry<R, F>(
    provider: &str,
    attempts: u32,
    build: F,
) -> Result<R, GenerationError>
where
    R: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let mut last_error = None;

    for attempt in 0..attempts {
        match build().send().await {
            Ok(resp) if resp.status().is_success() => {
                return resp.json::<R>().await.map_err(|e| {
                    GenerationError::CapabilityFailure(format!(
                        "{provider} response parse error: {e}"
                    ))
                });
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                let err = GenerationError::CapabilityFailure(format!(
                    "{provider} request failed: {status} {body}"
                ));
                if !is_retryable(status) {
                    return Err(err);
                }
                last_error = Some(err);
            }
            Err(e) => {
                last_error = Some(GenerationError::CapabilityFailure(format!(
                    "{provider} request failed: {e}"
                )));
            }
        }

        if attempt + 1 < attempts {
            let backoff = Duration::from_secs(2u64.pow(attempt + 1));
            debug!(provider, attempt, ?backoff, "retrying generation request");
            sleep(backoff).await;
        }
    }

    Err(last_error.unwrap_or_else(|| {
        GenerationError::CapabilityFailure(format!(
            "{provider} failed after {attempts} attempts"
        ))
    }))
}
