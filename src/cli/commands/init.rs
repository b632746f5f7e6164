//! Init command - create a project-local slipway.toml

use crate::cli::args::InitArgs;
use crate::config::PROJECT_FILE;
use crate::error::{SlipwayError, SlipwayResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for the project config; doubles as the build recipe file, so
/// editing it invalidates the previous build.
const INIT_TEMPLATE: &str = r#"# Slipway project configuration
# Settings here override your global config (~/.config/slipway/config.toml).
# This file is also a build input: changing it triggers a rebuild on the
# next serve.

[engine]
# binary = "docker"              # or "podman"
# network = "myapp-net"          # shared network name override

[build]
# base_image = "docker.io/library/python:3.12-slim"
# prefix = "/opt/deps"           # isolated install prefix inside the image
# manifest_dir = "requirements"  # holds main.txt, dev.txt, tests.txt
# image_prefix = "slipway"
# require_hashes = true
# workdir = "/app"

[verify]
# test_command = ["pytest", "--cov"]
# lint_command = ["flake8"]

[[service]]
name = "ingest"
command = ["python", "-m", "ingest"]
ports = ["1514:1514"]

[[service]]
name = "loader"
command = ["python", "-m", "loader"]

[service.env]
INGEST_HOST = "ingest"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> SlipwayResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| SlipwayError::io("getting current directory", e))?,
    };

    let config_path = target_dir.join(PROJECT_FILE);

    if config_path.exists() && !args.force {
        return Err(SlipwayError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| SlipwayError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> SlipwayResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| SlipwayError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
