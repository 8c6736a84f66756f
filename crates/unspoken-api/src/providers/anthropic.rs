use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use unspoken_types::api::ChatTurn;

use super::{ChatProvider, MAX_OUTPUT_TOKENS, ProviderError, TEMPERATURE};

const PROVIDER: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system: String,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Message {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            model: model.into(),
        }
    }

    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "claude-3-5-haiku-latest")
    }

    pub fn build_request(&self, system_prompt: &str, turns: &[ChatTurn]) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            system: system_prompt.to_string(),
            messages: turns
                .iter()
                .map(|turn| Message {
                    role: if turn.role == "assistant" { "assistant" } else { "user" },
                    content: turn.content.clone(),
                })
                .collect(),
        }
    }

    /// Concatenated text blocks, or `None` if there were none.
    pub fn extract_text(response: MessageResponse) -> Option<String> {
        let text: String = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, system_prompt: &str, turns: &[ChatTurn]) -> Result<String, ProviderError> {
        let url = format!("{}/messages", self.base_url);
        let body = self.build_request(system_prompt, turns);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status {
                provider: PROVIDER,
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessageResponse = response.json().await?;
        Self::extract_text(parsed).ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
