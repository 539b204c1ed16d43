//! Model gateway: the chat-completions backend that decides, per round,
//! whether to answer or request tools.

mod openai;
mod types;

pub use openai::OpenAiClient;
pub use types::{
    ChatMessage, ChatResponse, FunctionCall, Role, TokenUsage, ToolCall, ToolFunction, ToolSchema,
};

use async_trait::async_trait;
use thiserror::Error;

/// Failure of the backend call itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned no choices")]
    EmptyChoices,
}

/// A chat-completions backend.
///
/// Passing `tools: None` disables tool offering for that call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, GatewayError>;
}
