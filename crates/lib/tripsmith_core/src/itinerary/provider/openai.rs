//! OpenAI chat-completions provider.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{MAX_RETRY_ATTEMPTS, TextGenerator, send_json_with_retry};
use crate::itinerary::GenerationError;
use crate::itinerary::config::GenerationConfig;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

pub struct OpenAiGenerator {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl OpenAiGenerator {
    pub fn new(client: Client, config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client,
            url: format!("{}/chat/completions", config.base_url),
            model: config.model.clone(),
            api_key: config.require_api_key()?.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let resp: ChatResponse = send_json_with_retry("openai", MAX_RETRY_ATTEMPTS, || {
            self.client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&body)
        })
        .await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                GenerationError::CapabilityFailure("openai returned empty choices".to_string())
            })
    }
}
