//! Ollama provider (non-streaming `/api/generate`). Single attempt.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TextGenerator, send_json_with_retry};
use crate::itinerary::GenerationError;
use crate::itinerary::config::GenerationConfig;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: Option<String>,
}

pub struct OllamaGenerator {
    client: Client,
    url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(client: Client, config: &GenerationConfig) -> Self {
        Self {
            client,
            url: format!("{}/api/generate", config.base_url),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let resp: OllamaResponse =
            send_json_with_retry("ollama", 1, || self.client.post(&self.url).json(&body)).await?;
        resp.response
            .filter(|r| !r.is_empty())
            .ok_or_else(|| GenerationError::CapabilityFailure("ollama returned no text".into()))
    }
}
