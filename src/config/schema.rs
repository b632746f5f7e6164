//! Configuration schema for slipway
//!
//! Global config is stored at `~/.config/slipway/config.toml`; a
//! project-local `slipway.toml` overrides it and doubles as the build
//! recipe file for staleness tracking.

use crate::manifest::BuildMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container engine settings
    pub engine: EngineConfig,

    /// Image build settings
    pub build: BuildConfig,

    /// Test and lint runner settings
    pub verify: VerifyConfig,

    /// Service definitions, built independently and composed at serve time
    #[serde(rename = "service")]
    pub services: Vec<ServiceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            build: BuildConfig::default(),
            verify: VerifyConfig::default(),
            services: default_services(),
        }
    }
}

/// Container engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine binary to drive (docker or podman)
    pub binary: String,

    /// Compose network name (derived from the image prefix if unset)
    pub network: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            network: None,
        }
    }
}

/// Image build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Base image for both stages
    pub base_image: String,

    /// Isolated dependency install prefix inside the image
    pub prefix: String,

    /// Directory holding the dependency manifests, relative to the project
    pub manifest_dir: PathBuf,

    /// Prefix for image tags and container names
    pub image_prefix: String,

    /// Enforce integrity hashes when installing manifests
    pub require_hashes: bool,

    /// Working directory for service source inside the image
    pub workdir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            base_image: "docker.io/library/python:3.12-slim".to_string(),
            prefix: "/opt/deps".to_string(),
            manifest_dir: PathBuf::from("requirements"),
            image_prefix: "slipway".to_string(),
            require_hashes: true,
            workdir: "/app".to_string(),
        }
    }
}

impl BuildConfig {
    /// Image tag for a service in a mode, e.g. `slipway-ingest:production`
    pub fn image_tag(&self, service: &str, mode: BuildMode) -> String {
        format!("{}-{}:{}", self.image_prefix, service, mode)
    }

    /// Container name for a composed service, e.g. `slipway-ingest`
    pub fn container_name(&self, service: &str) -> String {
        format!("{}-{}", self.image_prefix, service)
    }
}

/// One service: build context, runtime command, wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name, also its network alias at serve time
    pub name: String,

    /// Build context, relative to the project root
    #[serde(default = "default_context")]
    pub context: PathBuf,

    /// Runtime command, baked into the image as CMD
    #[serde(default)]
    pub command: Vec<String>,

    /// Published ports (host:container)
    #[serde(default)]
    pub ports: Vec<String>,

    /// Environment variables set at serve time
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

/// Verification task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Service whose development image hosts the test and lint runs
    /// (first declared service if unset)
    pub service: Option<String>,

    /// Test command; a path filter and extra args are appended
    pub test_command: Vec<String>,

    /// Lint command, run over the mounted source tree
    pub lint_command: Vec<String>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            service: None,
            test_command: vec!["pytest".to_string(), "--cov".to_string()],
            lint_command: vec!["flake8".to_string()],
        }
    }
}

fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            name: "ingest".to_string(),
            context: default_context(),
            command: vec!["python".to_string(), "-m".to_string(), "ingest".to_string()],
            ports: vec!["1514:1514".to_string()],
            env: HashMap::new(),
        },
        ServiceConfig {
            name: "loader".to_string(),
            context: default_context(),
            command: vec!["python".to_string(), "-m".to_string(), "loader".to_string()],
            ports: vec![],
            env: HashMap::from([("INGEST_HOST".to_string(), "ingest".to_string())]),
        },
    ]
}
