//! Investment Insights CLI
//!
//! Main entry point for the insight command-line tool.
//! Ingests central-bank publications and answers questions grounded in them.

mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::{AskCommand, CleanCommand, IngestCommand, RetrieveCommand, StatsCommand};
use insight_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Investment Insights CLI - grounded answers from official publications
#[derive(Parser, Debug)]
#[command(name = "insight")]
#[command(about = "Grounded answers from official economic publications", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "INSIGHT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file (default: .insight/config.yaml)
    #[arg(short, long, global = true, env = "INSIGHT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (groq, ollama)
    #[arg(short, long, global = true, env = "INSIGHT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "INSIGHT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chunk, embed and index the corpus
    Ingest(IngestCommand),

    /// Ask a question grounded in the ingested publications
    Ask(AskCommand),

    /// Show the chunks retrieved for a question
    Retrieve(RetrieveCommand),

    /// Show collection statistics
    Stats(StatsCommand),

    /// Remove every entry from the collection
    Clean(CleanCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file decide which YAML file is read
    let config = AppConfig::load_with(cli.workspace.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    // Remaining CLI flags override file and environment
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Investment Insights CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    // Ensure .insight directory exists
    config.ensure_state_dir()?;

    // Emit command span
    let command_name = match &cli.command {
        Commands::Ingest(_) => "ingest",
        Commands::Ask(_) => "ask",
        Commands::Retrieve(_) => "retrieve",
        Commands::Stats(_) => "stats",
        Commands::Clean(_) => "clean",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
    };

    // Log completion
    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
