//! Tool definitions for the code quality agent.
//!
//! This module defines the two tools the LLM can call, parses their
//! arguments into typed requests and executes them against the content
//! cache.

use crate::analysis::{self, MetricsOutcome};
use crate::cache::ContentCache;
use crate::github::{FetchOutcome, GithubFetcher};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const FETCH_GITHUB_FILE: &str = "fetch_github_file";
pub const ANALYZE_CODE_QUALITY: &str = "analyze_code_quality";

/// Tool definition for the chat-completions tool-calling API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Arguments of `fetch_github_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchArgs {
    pub owner: String,
    pub repo: String,
    pub file_path: String,
}

/// Arguments of `analyze_code_quality`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzeArgs {
    pub file_path: String,
}

/// A validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    FetchGithubFile(FetchArgs),
    AnalyzeCodeQuality(AnalyzeArgs),
}

/// Why a tool call was rejected before execution.
#[derive(Debug, Error)]
pub enum ToolArgsError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    Malformed {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid arguments for {tool}: '{field}' must not be empty")]
    EmptyField { tool: String, field: &'static str },
}

impl ToolRequest {
    /// Parse a tool name and its serialized arguments.
    pub fn parse(name: &str, arguments: &str) -> Result<Self, ToolArgsError> {
        match name {
            FETCH_GITHUB_FILE => {
                let args: FetchArgs = parse_args(name, arguments)?;
                require_non_empty(name, "owner", &args.owner)?;
                require_non_empty(name, "repo", &args.repo)?;
                require_non_empty(name, "file_path", &args.file_path)?;
                Ok(ToolRequest::FetchGithubFile(args))
            }
            ANALYZE_CODE_QUALITY => {
                let args: AnalyzeArgs = parse_args(name, arguments)?;
                require_non_empty(name, "file_path", &args.file_path)?;
                Ok(ToolRequest::AnalyzeCodeQuality(args))
            }
            other => Err(ToolArgsError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolRequest::FetchGithubFile(_) => FETCH_GITHUB_FILE,
            ToolRequest::AnalyzeCodeQuality(_) => ANALYZE_CODE_QUALITY,
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: &str,
) -> Result<T, ToolArgsError> {
    // Some models send an empty string for "no arguments".
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };

    serde_json::from_str(arguments).map_err(|source| ToolArgsError::Malformed {
        tool: tool.to_string(),
        source,
    })
}

fn require_non_empty(
    tool: &str,
    field: &'static str,
    value: &str,
) -> Result<(), ToolArgsError> {
    if value.trim().is_empty() {
        return Err(ToolArgsError::EmptyField {
            tool: tool.to_string(),
            field,
        });
    }
    Ok(())
}

/// Result of executing a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Fetch(FetchOutcome),
    Metrics(MetricsOutcome),
    /// The call never ran: unknown tool or invalid arguments.
    Rejected(String),
}

impl ToolResult {
    pub fn to_value(&self) -> Value {
        match self {
            ToolResult::Fetch(outcome) => outcome.to_value(),
            ToolResult::Metrics(outcome) => outcome.to_value(),
            ToolResult::Rejected(error) => json!({
                "success": false,
                "error": error,
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        match self {
            ToolResult::Fetch(outcome) => outcome.is_error(),
            ToolResult::Metrics(outcome) => outcome.is_error(),
            ToolResult::Rejected(_) => true,
        }
    }
}

/// The tools executor that handles tool calls.
///
/// Owns the content cache for one agent run, so fetched files are visible to
/// later `analyze_code_quality` calls of the same run only.
pub struct ToolExecutor {
    fetcher: GithubFetcher,
    cache: ContentCache,
}

impl ToolExecutor {
    pub fn new(fetcher: GithubFetcher) -> Self {
        Self {
            fetcher,
            cache: ContentCache::new(),
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Parse and execute a tool call.
    ///
    /// Unknown tools and invalid arguments come back as
    /// [`ToolResult::Rejected`]; only transport failures are `Err`.
    pub async fn dispatch(&mut self, name: &str, arguments: &str) -> Result<ToolResult> {
        debug!("Executing tool: {} with args: {}", name, arguments);

        match ToolRequest::parse(name, arguments) {
            Ok(request) => {
                debug!("Validated {} request", request.name());
                self.execute(request).await
            }
            Err(e) => {
                warn!("Rejected tool call {}: {}", name, e);
                Ok(ToolResult::Rejected(e.to_string()))
            }
        }
    }

    /// Execute an already validated request.
    pub async fn execute(&mut self, request: ToolRequest) -> Result<ToolResult> {
        match request {
            ToolRequest::FetchGithubFile(args) => {
                let outcome = self
                    .fetcher
                    .fetch(&mut self.cache, &args.owner, &args.repo, &args.file_path)
                    .await?;
                Ok(ToolResult::Fetch(outcome))
            }
            ToolRequest::AnalyzeCodeQuality(args) => Ok(ToolResult::Metrics(analysis::analyze(
                &self.cache,
                &args.file_path,
            ))),
        }
    }
}

/// Get the tool definitions for the chat-completions API.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: ANALYZE_CODE_QUALITY.to_string(),
                description: "Analyzes code that was already fetched and returns metrics."
                    .to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "file_path": {
                            "type": "string",
                            "description": "Path of the file to analyze (must have been fetched first)"
                        }
                    },
                    "required": ["file_path"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: FETCH_GITHUB_FILE.to_string(),
                description: "Fetches a file from a GitHub repository. Provide owner, repo name, and file path.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "owner": {
                            "type": "string",
                            "description": "GitHub username or org"
                        },
                        "repo": {
                            "type": "string",
                            "description": "Repository name"
                        },
                        "file_path": {
                            "type": "string",
                            "description": "Path to file in repo"
                        }
                    },
                    "required": ["owner", "repo", "file_path"]
                }),
            },
        },
    ]
}
