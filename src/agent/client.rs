//! Chat-completions client.
//!
//! The agent talks to the model through [`ChatModel`]. The HTTP
//! implementation targets OpenAI-compatible endpoints; Groq is the default.

use crate::agent::tools::ToolDefinition;
use crate::models::{ChatMessage, ToolCallMessage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat-completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: String,
    pub parallel_tool_calls: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// The assistant message of a completion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
}

impl AssistantReply {
    #[cfg(test)]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: None,
        }
    }

    #[cfg(test)]
    pub fn with_tool_calls(tool_calls: Vec<ToolCallMessage>) -> Self {
        Self {
            content: None,
            tool_calls: Some(tool_calls),
        }
    }

    /// Requested tool calls; an empty list counts as none.
    pub fn requested_calls(&self) -> &[ToolCallMessage] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantReply,
}

/// A model that can complete a conversation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply>;

    fn name(&self) -> &str;
}

/// Settings for [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL up to and including the API version, e.g. `https://api.groq.com/openai/v1`.
    pub api_url: String,
    pub api_key: String,
    /// None keeps the HTTP client default.
    pub timeout_seconds: Option<u64>,
}

/// HTTP client for OpenAI-compatible chat-completions endpoints.
pub struct ChatCompletionsClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ChatCompletionsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatModel for ChatCompletionsClient {
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply> {
        let url = self.endpoint();
        debug!("Sending chat request with {} messages", request.messages.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s",
                        self.config.timeout_seconds.unwrap_or_default()
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to model API at {}", self.config.api_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Model API error {}: {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .context("Chat completion response contained no choices")
    }

    fn name(&self) -> &str {
        &self.config.api_url
    }
}
