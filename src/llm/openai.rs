//! Chat-completions client for Azure OpenAI deployments and OpenAI-compatible
//! endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GatewayConfig;

use super::{ChatMessage, ChatResponse, GatewayError, LlmClient, TokenUsage, ToolSchema};

/// Client for the `/chat/completions` route.
#[derive(Clone)]
pub struct OpenAiClient {
    config: GatewayConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSchema]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl OpenAiClient {
    /// Create a client. `timeout` bounds the whole HTTP exchange.
    pub fn new(config: GatewayConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    fn build_request<'a>(
        model: &'a str,
        messages: &'a [ChatMessage],
        tools: Option<&'a [ToolSchema]>,
    ) -> ChatRequest<'a> {
        let tools = tools.filter(|t| !t.is_empty());
        ChatRequest {
            model,
            messages,
            tool_choice: tools.map(|_| "auto"),
            tools,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: Option<&[ToolSchema]>,
    ) -> Result<ChatResponse, GatewayError> {
        let url = self.config.chat_completions_url();
        let body = Self::build_request(model, messages, tools);

        let request = self.client.post(&url).json(&body);
        let request = if self.config.api_version.is_some() {
            request.header("api-key", &self.config.api_key)
        } else {
            request.bearer_auth(&self.config.api_key)
        };

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        parse_completion(&text)
    }
}

fn parse_completion(text: &str) -> Result<ChatResponse, GatewayError> {
    let completion: ChatCompletion = serde_json::from_str(text)?;
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or(GatewayError::EmptyChoices)?;

    Ok(ChatResponse {
        message: choice.message,
        usage: completion.usage,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let head: String = body.chars().take(MAX).collect();
        format!("{}... [truncated]", head)
    }
}
