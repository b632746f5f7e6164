//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Slipway - incremental build and serve orchestrator
///
/// Decides when service images need rebuilding, assembles them through a
/// two-stage pipeline, and runs the service set together.
#[derive(Parser, Debug)]
#[command(name = "slipway")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Global configuration file path
    #[arg(short, long, global = true, env = "SLIPWAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip project-local slipway.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build service images unconditionally
    Build(BuildArgs),

    /// Build if inputs changed, then run all services together
    Serve(ServeArgs),

    /// Run the test suite inside a development image
    Test(TestArgs),

    /// Run the linter over the source tree
    Lint,

    /// Check engine, manifests, and build freshness
    Status(StatusArgs),

    /// Initialize a project-local slipway.toml
    Init(InitArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Build a single service instead of all of them
    #[arg(short, long)]
    pub service: Option<String>,

    /// Build in development mode (adds dev and test manifests)
    #[arg(long)]
    pub dev: bool,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Serve development-mode images
    #[arg(long)]
    pub dev: bool,
}

/// Arguments for the test command
#[derive(Parser, Debug)]
pub struct TestArgs {
    /// Path filter passed to the test command
    pub path: Option<PathBuf>,

    /// Extra arguments passed through to the test command
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the init command
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite existing slipway.toml
    #[arg(short, long)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the merged configuration
    Show,

    /// Show the global configuration file path
    Path,
}

/// Output format for the status command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}
