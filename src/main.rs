//! CodePulse - code quality agent for GitHub files
//!
//! A CLI tool that lets an LLM fetch source files from GitHub and compute
//! simple metrics on them through tool calls, then prints the model's
//! assessment.
//!
//! Exit codes:
//!   0 - The agent produced an answer (or hit the iteration cap)
//!   1 - Runtime error (missing API key, config, model or network failure)

mod agent;
mod analysis;
mod cache;
mod cli;
mod config;
mod github;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::Config;
use models::{RunMetadata, RunReport};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("CodePulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .codepulse.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!(
        "✅ Created {} with default settings.",
        config::CONFIG_FILE_NAME
    );
    println!("   Edit it to customize model, iteration cap, and GitHub settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the agent once and print its answer.
async fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();
    let started_at = Utc::now();

    if dotenv::dotenv().is_ok() {
        debug!("Loaded environment from .env");
    }

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate()?;
    let api_key = config.api_key()?;

    let client = agent::ChatCompletionsClient::new(agent::ClientConfig {
        api_url: config.model.api_url.clone(),
        api_key,
        timeout_seconds: config.model.timeout_seconds,
    })?;

    let fetcher = github::GithubFetcher::new(github::FetchOptions::from(&config))?;

    let agent_config = agent::AgentConfig {
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        max_tokens: config.model.max_tokens,
        max_iterations: config.agent.max_iterations,
        system_prompt: config.agent.system_prompt.clone(),
    };

    println!("🤖 Starting code quality agent...");
    println!("   Model: {}", config.model.name);
    println!("   API: {}", config.model.api_url);
    println!("   Max iterations: {}", config.agent.max_iterations);
    println!("\n{}", "=".repeat(60));
    println!("USER: {}", args.prompt);
    println!("{}\n", "=".repeat(60));

    let mut agent =
        agent::CodeQualityAgent::new(agent_config, client, agent::ToolExecutor::new(fetcher));
    let run = agent.run(&args.prompt).await?;
    debug!("Final transcript has {} messages", run.transcript.len());

    println!("\n📝 AGENT FINAL RESPONSE:\n{}\n", run.outcome.final_text());
    println!("   Iterations: {}", run.iterations);
    println!("   Tool calls: {}", run.tool_calls.len());
    println!("   Files cached: {}", agent.tool_executor().cache().len());

    let report = RunReport {
        metadata: RunMetadata {
            prompt: args.prompt.clone(),
            model_used: config.model.name.clone(),
            started_at,
            iterations: run.iterations,
            max_iterations: config.agent.max_iterations,
            duration_seconds: start_time.elapsed().as_secs_f64(),
        },
        outcome: run.outcome,
        tool_calls: run.tool_calls,
    };

    if report.failed_tool_calls() > 0 {
        warn!(
            "{} of {} tool calls returned an error",
            report.failed_tool_calls(),
            report.tool_calls.len()
        );
    }

    if let Some(ref output) = config.general.output {
        let content = match args.format {
            OutputFormat::Json => report::generate_json_report(&report)?,
            OutputFormat::Markdown => report::generate_markdown_report(&report),
        };

        std::fs::write(output, &content)
            .with_context(|| format!("Failed to write report to {}", output))?;
        println!("\n✅ Run report saved to: {}", output);
    }

    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
