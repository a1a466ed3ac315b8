//! CodeRAG CLI
//!
//! Main entry point for the coderag command-line tool.
//! Answers building code questions with retrieval-grounded synthesis.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, SectionsCommand, StatsCommand};
use coderag_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// CodeRAG CLI - building code Q&A over a section-aware document index
#[derive(Parser, Debug)]
#[command(name = "coderag")]
#[command(about = "Building code Q&A with section-aware retrieval", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CODERAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to the corpus file (hierarchical Markdown)
    #[arg(long, global = true, env = "CODERAG_CORPUS")]
    corpus: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CODERAG_CONFIG")]
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

    /// Synthesizer provider (ollama, etc.)
    #[arg(short, long, global = true, env = "CODERAG_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "CODERAG_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask a question against the indexed corpus
    Ask(AskCommand),

    /// Inspect indexed sections and their cross-references
    Sections(SectionsCommand),

    /// Show index statistics
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.corpus,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("CodeRAG CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Ensure .coderag directory exists
    config.ensure_state_dir()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Sections(_) => "sections",
        Commands::Stats(_) => "stats",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Sections(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
