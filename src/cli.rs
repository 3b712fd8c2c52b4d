//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Request used when no prompt is given on the command line.
pub const DEFAULT_PROMPT: &str = "Analyze the code quality of 'src/core.js' from the 'jquery/jquery' repository. \
Give me a quality score out of 10 and explain what makes this legacy code.";

/// CodePulse - code quality agent for GitHub files
///
/// Asks an LLM to judge code quality. The model fetches files from GitHub
/// and computes line and function metrics through tools, one call at a time.
///
/// Examples:
///   codepulse
///   codepulse "Rate 'lib/router.js' from 'expressjs/express' out of 10"
///   codepulse --model llama-3.1-8b-instant --max-iterations 5
///   codepulse --output run.md --verbose
///   codepulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Request sent to the agent
    #[arg(value_name = "PROMPT", default_value = DEFAULT_PROMPT)]
    pub prompt: String,

    /// Model name to request
    ///
    /// Can also be set via CODEPULSE_MODEL env var or .codepulse.toml config.
    #[arg(short, long, env = "CODEPULSE_MODEL")]
    pub model: Option<String>,

    /// Chat-completions base URL (OpenAI-compatible)
    #[arg(long, value_name = "URL", env = "CODEPULSE_API_URL")]
    pub api_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .codepulse.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum model round-trips before giving up
    #[arg(long, value_name = "COUNT")]
    pub max_iterations: Option<usize>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens per model response
    #[arg(long, value_name = "TOKENS")]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds for model and GitHub calls
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write a run report (tool calls and final answer) to this file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run report format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .codepulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.prompt.trim().is_empty() {
            return Err("Prompt must not be empty".to_string());
        }

        if let Some(ref api_url) = self.api_url {
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.max_iterations == Some(0) {
            return Err("Max iterations must be at least 1".to_string());
        }

        if self.max_tokens == Some(0) {
            return Err("Max tokens must be at least 1".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
