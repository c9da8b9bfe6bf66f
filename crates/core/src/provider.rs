//! Provider trait — the abstraction over chat-completion backends.
//!
//! A Provider knows how to send a message list to an LLM and get the text of
//! the first choice back. Implementations live in `aula-providers`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::WireMessage;

/// A single chat-completion request, system prompt already prepended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g. "gpt-4.1-mini", "deepseek-chat")
    pub model: String,

    /// System message followed by the caller's history
    pub messages: Vec<WireMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The provider's answer, reduced to what the pipeline uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Content of the first choice; empty when the provider returned none.
    pub content: String,

    /// Which model actually responded (may differ from requested)
    #[serde(default)]
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The core Provider trait.
///
/// The gateway calls `complete()` without knowing which backend is behind it.
/// Implementations must not retry; a call is issued at most once.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g. "openai", "deepseek").
    fn name(&self) -> &str;

    /// Send a request and get the first choice's text.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError>;
}
