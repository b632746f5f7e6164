//! Container engine abstraction
//!
//! All image and container operations go through the `ContainerEngine`
//! trait. The shipped implementation shells out to the configured engine
//! binary (docker by default, podman works identically); the trait seam
//! also allows test doubles.

mod shell;

pub use shell::ShellEngine;

use crate::config::Config;
use crate::error::SlipwayResult;
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Specification for starting a service container
#[derive(Debug, Clone, Default)]
pub struct RunSpec {
    /// Image tag to run
    pub image: String,
    /// Container name (engine-assigned if unset)
    pub name: Option<String>,
    /// Network to join
    pub network: Option<String>,
    /// Alias on that network (how peers address this container)
    pub network_alias: Option<String>,
    /// Environment variables
    pub env: Vec<(String, String)>,
    /// Published ports (host:container)
    pub ports: Vec<String>,
    /// Volume mounts (host:container)
    pub volumes: Vec<String>,
    /// Working directory override
    pub workdir: Option<String>,
    /// Command override (empty = image CMD)
    pub command: Vec<String>,
}

/// Outcome of an image build: exit status plus the full output for
/// error reporting.
#[derive(Debug)]
pub struct BuildStatus {
    pub success: bool,
    pub output: Vec<String>,
}

/// Abstract container engine interface
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Check if the engine binary responds
    async fn is_available(&self) -> bool;

    /// Engine version string for diagnostics
    async fn version(&self) -> SlipwayResult<String>;

    /// Build an image from a context and recipe file, streaming each
    /// output line to `on_output`
    async fn build_image(
        &self,
        context: &Path,
        containerfile: &Path,
        tag: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> SlipwayResult<BuildStatus>;

    /// Run a detached container, returning its id
    async fn run_detached(&self, spec: &RunSpec) -> SlipwayResult<String>;

    /// Run a container with inherited stdio, returning its exit code
    async fn run_attached(&self, spec: &RunSpec) -> SlipwayResult<i32>;

    /// Block until a container exits, returning its exit code
    async fn wait(&self, container: &str) -> SlipwayResult<i32>;

    /// Stop a container gracefully
    async fn stop(&self, container: &str) -> SlipwayResult<()>;

    /// Remove a container, stopped or running
    async fn remove(&self, container: &str) -> SlipwayResult<()>;

    /// Create the network if it does not exist yet
    async fn ensure_network(&self, name: &str) -> SlipwayResult<()>;

    /// The engine binary name, for display
    fn engine_name(&self) -> &str;
}

/// Create the engine configured for this project
pub fn create_engine(config: &Config) -> Box<dyn ContainerEngine> {
    Box::new(ShellEngine::new(config.engine.binary.clone()))
}

/// Max number of output lines to include in build error messages.
const BUILD_ERROR_TAIL_LINES: usize = 50;

/// Extract the useful tail of build output for error diagnostics.
///
/// Returns the last `BUILD_ERROR_TAIL_LINES` lines so error messages are
/// actionable without being overwhelming.
pub fn build_error_output(lines: &[String]) -> String {
    let total = lines.len();
    let tail = if total > BUILD_ERROR_TAIL_LINES {
        &lines[total - BUILD_ERROR_TAIL_LINES..]
    } else {
        lines
    };
    tail.join("\n")
}

/// Stream stdout+stderr from a child process, calling `on_output` for each
/// line. Returns all collected output lines for error reporting.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(String) + Send + Sync),
) -> Vec<String> {
    let stderr = child.stderr.take().expect("stderr piped");
    let stdout = child.stdout.take().expect("stdout piped");

    let mut stderr_reader = BufReader::new(stderr).lines();
    let mut stdout_reader = BufReader::new(stdout).lines();

    let mut all_output = Vec::new();
    let mut stderr_done = false;
    let mut stdout_done = false;

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = stderr_reader.next_line(), if !stderr_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stderr_done = true,
                }
            }
            line = stdout_reader.next_line(), if !stdout_done => {
                match line {
                    Ok(Some(line)) => {
                        on_output(line.clone());
                        all_output.push(line);
                    }
                    _ => stdout_done = true,
                }
            }
        }
    }

    all_output
}
