//! LLM agent modules for code quality analysis.
//!
//! This module provides the tool-calling agent, its tools and the
//! chat-completions client it talks to.

pub mod agent_loop;
pub mod client;
pub mod tools;

pub use agent_loop::{AgentConfig, CodeQualityAgent};
pub use client::{ChatCompletionsClient, ClientConfig};
pub use tools::ToolExecutor;
