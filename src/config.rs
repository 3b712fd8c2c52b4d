//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.codepulse.toml` files and reading the API credential from the
//! environment.

use crate::agent::agent_loop::AGENT_SYSTEM_PROMPT;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = ".codepulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// GitHub access settings.
    #[serde(default)]
    pub github: GithubConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write a run report to this path.
    #[serde(default)]
    pub output: Option<String>,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub name: String,

    /// Chat-completions base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens in response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds. Unset means no explicit timeout.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_seconds: None,
        }
    }
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    4096
}

/// Agent loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum model round-trips per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// System instruction seeded into every run.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: default_system_prompt(),
        }
    }
}

fn default_max_iterations() -> usize {
    10
}

fn default_system_prompt() -> String {
    AGENT_SYSTEM_PROMPT.to_string()
}

/// GitHub raw-content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Raw-content host.
    #[serde(default = "default_raw_base_url")]
    pub raw_base_url: String,

    /// Branch names tried in order.
    #[serde(default = "default_branches")]
    pub branches: Vec<String>,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            raw_base_url: default_raw_base_url(),
            branches: default_branches(),
        }
    }
}

fn default_raw_base_url() -> String {
    crate::github::fetcher::DEFAULT_RAW_BASE_URL.to_string()
}

fn default_branches() -> Vec<String> {
    crate::github::fetcher::DEFAULT_BRANCHES
        .iter()
        .map(|b| b.to_string())
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.codepulse.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings when given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.model.api_url = api_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(max_tokens) = args.max_tokens {
            self.model.max_tokens = max_tokens;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = Some(timeout);
        }
        if let Some(max_iterations) = args.max_iterations {
            self.agent.max_iterations = max_iterations;
        }
        if let Some(ref output) = args.output {
            self.general.output = Some(output.display().to_string());
        }
    }

    /// Check values that a config file can set to something unusable.
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_iterations == 0 {
            anyhow::bail!("agent.max_iterations must be at least 1");
        }
        if self.model.max_tokens == 0 {
            anyhow::bail!("model.max_tokens must be at least 1");
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            anyhow::bail!("model.temperature must be between 0.0 and 2.0");
        }
        if self.model.timeout_seconds == Some(0) {
            anyhow::bail!("model.timeout_seconds must be at least 1");
        }
        if self.github.branches.is_empty() {
            anyhow::bail!("github.branches must name at least one branch");
        }
        if self.github.branches.iter().any(|b| b.trim().is_empty()) {
            anyhow::bail!("github.branches must not contain empty names");
        }
        Ok(())
    }

    /// Read the API key from the environment variable named in the config.
    pub fn api_key(&self) -> Result<String> {
        let var = &self.model.api_key_env;
        let key = std::env::var(var).with_context(|| {
            format!("{} is not set (export it or add it to a .env file)", var)
        })?;

        if key.trim().is_empty() {
            anyhow::bail!("{} is set but empty", var);
        }

        Ok(key)
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
