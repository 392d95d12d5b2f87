//! Google Gemini provider (`models/{model}:generateContent`).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{MAX_RETRY_ATTEMPTS, TextGenerator, send_json_with_retry};
use crate::itinerary::GenerationError;
use crate::itinerary::config::GenerationConfig;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiGenerator {
    client: Client,
    url: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(client: Client, config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client,
            url: format!("{}/models/{}:generateContent", config.base_url, config.model),
            api_key: config.require_api_key()?.to_string(),
        })
    }
}

/// Concatenate the text parts of the first candidate.
fn first_candidate_text(resp: GenerateResponse) -> Option<String> {
    let parts = resp.candidates.into_iter().next()?.content?.parts;
    let text: String = parts.into_iter().filter_map(|p| p.text).collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };
        let resp: GenerateResponse = send_json_with_retry("gemini", MAX_RETRY_ATTEMPTS, || {
            self.client
                .post(&self.url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
        })
        .await?;

        first_candidate_text(resp).ok_or_else(|| {
            GenerationError::CapabilityFailure("gemini returned no candidate text".to_string())
        })
    }
}
