//! Chat-completion backends for the Echo companion.
//!
//! Two interchangeable providers implement the same contract; exactly one is
//! active per process.

pub mod anthropic;
pub mod gemini;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use unspoken_types::api::ChatTurn;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;

pub const TEMPERATURE: f32 = 0.8;
pub const MAX_OUTPUT_TOKENS: u32 = 500;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} response contained no text")]
    EmptyResponse { provider: &'static str },
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Produce the assistant's next turn. `turns` never contains `system` roles.
    async fn complete(&self, system_prompt: &str, turns: &[ChatTurn]) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(anyhow::anyhow!(
                "Unknown chat provider '{}' (expected gemini or anthropic)",
                other
            )),
        }
    }
}

/// Build the configured backend. No key means no backend.
pub fn build_provider(
    kind: ProviderKind,
    api_key: Option<String>,
    model: Option<String>,
) -> Option<Arc<dyn ChatProvider>> {
    let api_key = api_key.filter(|k| !k.trim().is_empty())?;
    let provider: Arc<dyn ChatProvider> = match kind {
        ProviderKind::Gemini => Arc::new(match model {
            Some(model) => GeminiProvider::new(api_key, model),
            None => GeminiProvider::with_default_model(api_key),
        }),
        ProviderKind::Anthropic => Arc::new(match model {
            Some(model) => AnthropicProvider::new(api_key, model),
            None => AnthropicProvider::with_default_model(api_key),
        }),
    };
    Some(provider)
}
