use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use unspoken_types::api::ChatTurn;

use super::{ChatProvider, MAX_OUTPUT_TOKENS, ProviderError, TEMPERATURE};

const PROVIDER: &str = "gemini";

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: model.into(),
        }
    }

    pub fn with_default_model(api_key: impl Into<String>) -> Self {
        Self::new(api_key, "gemini-1.5-flash")
    }

    /// Gemini has no system role here: the persona goes first as a user turn,
    /// and `assistant` turns become `model`.
    pub fn build_request(system_prompt: &str, turns: &[ChatTurn]) -> GenerateContentRequest {
        let persona = Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(system_prompt.to_string()),
            }],
        };

        let history = turns.iter().map(|turn| Content {
            role: Some(if turn.role == "assistant" { "model" } else { "user" }.to_string()),
            parts: vec![Part {
                text: Some(turn.content.clone()),
            }],
        });

        GenerateContentRequest {
            contents: std::iter::once(persona).chain(history).collect(),
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        }
    }

    /// Text of the first part of the first candidate.
    pub fn extract_text(response: GenerateContentResponse) -> Option<String> {
        response
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn complete(&self, system_prompt: &str, turns: &[ChatTurn]) -> Result<String, ProviderError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = Self::build_request(system_prompt, turns);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
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

        let parsed: GenerateContentResponse = response.json().await?;
        Self::extract_text(parsed).ok_or(ProviderError::EmptyResponse { provider: PROVIDER })
    }
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
