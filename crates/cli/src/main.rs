//! Strata CLI
//!
//! Main entry point for the strata command-line tool.
//! Runs the ingestion pipeline and inspects the schema history it builds.

mod commands;

use clap::{Parser, Subcommand};
use commands::{InferCommand, RunCommand, SchemaCommand, StatsCommand};
use std::path::PathBuf;
use strata_core::{config::AppConfig, logging, AppResult, LogFormat};
use tracing::Instrument;

/// Strata - schema inference and evolution for raw file ingestion
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Schema inference and evolution for raw file ingestion", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "STRATA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Log line format on stderr (text, json)
    #[arg(long, global = true, env = "STRATA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Process every file in the raw directory
    Run(RunCommand),

    /// Inspect the schema version history
    Schema(SchemaCommand),

    /// Print the inferred schema of a single file
    Infer(InferCommand),

    /// Show processed document counts per schema version
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load configuration from defaults, config file and environment
    let config = AppConfig::load_from(cli.workspace.clone(), cli.config.clone())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.log_level,
        cli.log_format,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(
        config.log_level.as_deref(),
        config.log_format,
        config.no_color,
    )?;

    tracing::info!("Strata CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Store: {:?}", config.database_path());

    let command_name = match &cli.command {
        Commands::Run(_) => "run",
        Commands::Schema(_) => "schema",
        Commands::Infer(_) => "infer",
        Commands::Stats(_) => "stats",
    };
    let span = tracing::info_span!("command", name = command_name);

    // Route to command handlers
    let dispatch = async {
        let result = match cli.command {
            Commands::Run(cmd) => cmd.execute(&config).await,
            Commands::Schema(cmd) => cmd.execute(&config).await,
            Commands::Infer(cmd) => cmd.execute().await,
            Commands::Stats(cmd) => cmd.execute(&config).await,
        };

        match &result {
            Ok(_) => tracing::info!("Command completed successfully"),
            Err(e) => tracing::error!("Command failed: {}", e),
        }
        result
    };

    dispatch.instrument(span).await
}
