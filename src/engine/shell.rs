//! Engine implementation driving the docker/podman CLI
//!
//! Every operation execs the configured binary with
//! `tokio::process::Command`. Build output is streamed line by line so the
//! caller can render progress.

use crate::engine::{stream_child_output, BuildStatus, ContainerEngine, RunSpec};
use crate::error::{SlipwayError, SlipwayResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Container engine backed by the docker or podman CLI
pub struct ShellEngine {
    binary: String,
}

impl ShellEngine {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }

    /// Execute an engine command and return the output
    async fn exec(&self, args: &[&str]) -> SlipwayResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.binary, args);

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SlipwayError::command_failed(format!("{} {:?}", self.binary, args), e))
    }

    /// Execute an engine command with inherited stdio
    async fn exec_inherit(&self, args: &[String]) -> SlipwayResult<i32> {
        debug!("Executing interactively: {} {:?}", self.binary, args);

        let status = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| SlipwayError::command_failed(format!("{} {:?}", self.binary, args), e))?;

        Ok(status.code().unwrap_or(-1))
    }

    /// Shared `run` argument assembly for detached and attached runs
    fn run_args(spec: &RunSpec) -> Vec<String> {
        let mut args = vec!["run".to_string()];

        if let Some(ref name) = spec.name {
            args.push("--name".to_string());
            args.push(name.clone());
        }
        if let Some(ref network) = spec.network {
            args.push("--network".to_string());
            args.push(network.clone());
        }
        if let Some(ref alias) = spec.network_alias {
            args.push("--network-alias".to_string());
            args.push(alias.clone());
        }
        for (key, value) in &spec.env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }
        for port in &spec.ports {
            args.push("-p".to_string());
            args.push(port.clone());
        }
        for volume in &spec.volumes {
            args.push("-v".to_string());
            args.push(volume.clone());
        }
        if let Some(ref workdir) = spec.workdir {
            args.push("-w".to_string());
            args.push(workdir.clone());
        }

        args.push(spec.image.clone());
        args.extend(spec.command.iter().cloned());

        args
    }
}

#[async_trait]
impl ContainerEngine for ShellEngine {
    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn version(&self) -> SlipwayResult<String> {
        let output = self.exec(&["--version"]).await?;
        if !output.status.success() {
            return Err(SlipwayError::EngineNotFound {
                binary: self.binary.clone(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    async fn build_image(
        &self,
        context: &Path,
        containerfile: &Path,
        tag: &str,
        on_output: &(dyn Fn(String) + Send + Sync),
    ) -> SlipwayResult<BuildStatus> {
        let command_desc = format!("{} build -t {}", self.binary, tag);
        debug!("Building image: {} (context {})", tag, context.display());

        let mut child = Command::new(&self.binary)
            .arg("build")
            .arg("-f")
            .arg(containerfile)
            .arg("-t")
            .arg(tag)
            .arg(context)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SlipwayError::command_failed(command_desc.clone(), e))?;

        let output = stream_child_output(&mut child, on_output).await;

        let status = child
            .wait()
            .await
            .map_err(|e| SlipwayError::command_failed(command_desc, e))?;

        if status.success() {
            info!("Built image: {}", tag);
        }

        Ok(BuildStatus {
            success: status.success(),
            output,
        })
    }

    async fn run_detached(&self, spec: &RunSpec) -> SlipwayResult<String> {
        let mut args = vec!["run".to_string(), "-d".to_string()];
        args.extend(Self::run_args(spec).into_iter().skip(1));

        let args_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.exec(&args_refs).await?;

        if output.status.success() {
            let id = String::from_utf8_lossy(&output.stdout).trim().to_string();
            info!("Container started: {}", &id[..12.min(id.len())]);
            Ok(id)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SlipwayError::ServiceStart {
                service: spec.name.clone().unwrap_or_else(|| spec.image.clone()),
                reason: stderr.trim().to_string(),
            })
        }
    }

    async fn run_attached(&self, spec: &RunSpec) -> SlipwayResult<i32> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        args.extend(Self::run_args(spec).into_iter().skip(1));
        self.exec_inherit(&args).await
    }

    async fn wait(&self, container: &str) -> SlipwayResult<i32> {
        let output = self.exec(&["wait", container]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SlipwayError::command_exec(
                format!("{} wait {}", self.binary, container),
                stderr,
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout.trim().parse::<i32>().map_err(|_| {
            SlipwayError::Internal(format!("unexpected wait output: {}", stdout.trim()))
        })
    }

    async fn stop(&self, container: &str) -> SlipwayResult<()> {
        let output = self.exec(&["stop", container]).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SlipwayError::command_exec(
                format!("{} stop {}", self.binary, container),
                stderr,
            ))
        }
    }

    async fn remove(&self, container: &str) -> SlipwayResult<()> {
        let output = self.exec(&["rm", "-f", container]).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SlipwayError::command_exec(
                format!("{} rm -f {}", self.binary, container),
                stderr,
            ))
        }
    }

    async fn ensure_network(&self, name: &str) -> SlipwayResult<()> {
        let inspect = self.exec(&["network", "inspect", name]).await?;
        if inspect.status.success() {
            debug!("Network exists: {}", name);
            return Ok(());
        }

        info!("Creating network: {}", name);
        let output = self.exec(&["network", "create", name]).await?;
        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SlipwayError::command_exec(
                format!("{} network create {}", self.binary, name),
                stderr,
            ))
        }
    }

    fn engine_name(&self) -> &str {
        &self.binary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> RunSpec {
        RunSpec {
            image: "slipway-ingest:production".to_string(),
            name: Some("slipway-ingest".to_string()),
            network: Some("slipway-net".to_string()),
            network_alias: Some("ingest".to_string()),
            env: vec![("INGEST_HOST".to_string(), "ingest".to_string())],
            ports: vec!["1514:1514".to_string()],
            volumes: vec![],
            workdir: None,
            command: vec![],
        }
    }

    #[test]
    fn run_args_full_spec() {
        let args = ShellEngine::run_args(&spec());
        assert_eq!(
            args,
            vec![
                "run",
                "--name",
                "slipway-ingest",
                "--network",
                "slipway-net",
                "--network-alias",
                "ingest",
                "-e",
                "INGEST_HOST=ingest",
                "-p",
                "1514:1514",
                "slipway-ingest:production",
            ]
        );
    }

    #[test]
    fn run_args_minimal_spec() {
        let args = ShellEngine::run_args(&RunSpec {
            image: "img:latest".to_string(),
            command: vec!["pytest".to_string(), "tests/".to_string()],
            ..RunSpec::default()
        });
        assert_eq!(args, vec!["run", "img:latest", "pytest", "tests/"]);
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let engine = ShellEngine::new("slipway-no-such-engine".to_string());
        assert!(!engine.is_available().await);
    }
}
