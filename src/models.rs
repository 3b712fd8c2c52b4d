//! Data models for the agent.
//!
//! This module contains the conversation transcript types shared by the
//! agent loop and the model client, and the records that make up a run
//! report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message author in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single message in the transcript, in chat-completions wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// Assistant turn that requested exactly one tool call.
    pub fn assistant_tool_call(call: ToolCallMessage) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(String::new()),
            tool_calls: Some(vec![call]),
            tool_call_id: None,
        }
    }

    /// Tool result answering the call with `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallMessage {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub call_type: String,
    pub function: FunctionCall,
}

fn default_call_type() -> String {
    "function".to_string()
}

/// Function name and its arguments, serialized as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

#[cfg(test)]
impl ToolCallMessage {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            call_type: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// How an agent run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum RunOutcome {
    /// The model answered without requesting a tool.
    Completed { answer: String },
    /// The iteration budget ran out first.
    MaxIterationsReached,
}

impl RunOutcome {
    pub const MAX_ITERATIONS_SENTINEL: &'static str = "Max iterations reached";

    /// The text handed back to the caller.
    pub fn final_text(&self) -> &str {
        match self {
            RunOutcome::Completed { answer } => answer,
            RunOutcome::MaxIterationsReached => Self::MAX_ITERATIONS_SENTINEL,
        }
    }
}

/// One executed tool call, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// 1-indexed model round-trip that requested the call.
    pub iteration: usize,
    pub call_id: String,
    pub name: String,
    /// Arguments exactly as the model sent them.
    pub arguments: String,
    pub result: Value,
    pub is_error: bool,
}

/// Metadata about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetadata {
    pub prompt: String,
    pub model_used: String,
    pub started_at: DateTime<Utc>,
    pub iterations: usize,
    pub max_iterations: usize,
    pub duration_seconds: f64,
}

/// Everything worth writing out after a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub outcome: RunOutcome,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl RunReport {
    /// Number of tool calls whose result was an error.
    pub fn failed_tool_calls(&self) -> usize {
        self.tool_calls.iter().filter(|c| c.is_error).count()
    }
}
