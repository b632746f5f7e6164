//! Slipway - incremental build and serve orchestrator
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use slipway::cli::{Cli, Commands};
use slipway::config::{ConfigManager, Workspace};
use slipway::error::SlipwayResult;
use slipway::ui;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SlipwayResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn (progress output only), 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("slipway=warn"),
        1 => EnvFilter::new("slipway=info"),
        _ => EnvFilter::new("slipway=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    ui::init_theme();

    // Init command doesn't need config loading
    if let Commands::Init(args) = cli.command {
        return slipway::cli::commands::init(args).await;
    }

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    let cwd = std::env::current_dir()
        .map_err(|e| slipway::error::SlipwayError::io("getting current directory", e))?;

    // Find project config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Project config discovery disabled (--no-local)");
        None
    } else {
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found project config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // The project root anchors the marker, build scratch space, and manifests
    let root = local_config_path
        .as_deref()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .unwrap_or(cwd);
    let ws = Workspace::new(root, config);

    // Dispatch to command
    match cli.command {
        Commands::Init(_) => unreachable!("Init handled above"),
        Commands::Build(args) => slipway::cli::commands::build(args, &ws).await,
        Commands::Serve(args) => slipway::cli::commands::serve(args, &ws).await,
        Commands::Test(args) => slipway::cli::commands::test(args, &ws).await,
        Commands::Lint => slipway::cli::commands::lint(&ws).await,
        Commands::Status(args) => slipway::cli::commands::status(args, &ws).await,
        Commands::Config(args) => slipway::cli::commands::config(args, &ws).await,
    }
}
