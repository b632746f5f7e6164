//! Configuration management for slipway

pub mod schema;

pub use schema::{BuildConfig, Config, EngineConfig, ServiceConfig, VerifyConfig};

use crate::error::{SlipwayError, SlipwayResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Project-local configuration file name; also the build recipe file
pub const PROJECT_FILE: &str = "slipway.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with the default global path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom global config path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default global config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slipway")
            .join("config.toml")
    }

    /// Walk upward from `start` looking for a project `slipway.toml`
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(PROJECT_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load the global config, overlaid with the project-local file if given.
    ///
    /// Local tables merge into global ones key by key; arrays (the service
    /// list) replace wholesale so a project fully owns its service set.
    pub async fn load_merged(&self, local: Option<&Path>) -> SlipwayResult<Config> {
        let mut value = if self.config_path.exists() {
            Self::read_value(&self.config_path).await?
        } else {
            debug!("Global config not found, using defaults");
            toml::Value::Table(toml::map::Map::new())
        };

        if let Some(path) = local {
            debug!("Merging project config: {}", path.display());
            let overlay = Self::read_value(path).await?;
            merge_values(&mut value, overlay);
        }

        let source = local.unwrap_or(&self.config_path);
        value
            .try_into()
            .map_err(|e: toml::de::Error| SlipwayError::ConfigInvalid {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn read_value(path: &Path) -> SlipwayResult<toml::Value> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SlipwayError::io(format!("reading config from {}", path.display()), e))?;

        content
            .parse::<toml::Value>()
            .map_err(|e| SlipwayError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Get the global config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep-merge `overlay` into `base`: tables merge recursively, everything
/// else (including arrays) is replaced by the overlay value.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// A resolved project: configuration plus the directory it belongs to.
///
/// All persisted state lives under `<root>/.slipway/`.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    pub fn new(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// State directory for the marker and rendered build recipes
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(".slipway")
    }

    /// Staleness marker path
    pub fn marker_path(&self) -> PathBuf {
        self.state_dir().join("fresh")
    }

    /// Scratch directory for rendered Containerfiles
    pub fn builds_dir(&self) -> PathBuf {
        self.state_dir().join("builds")
    }

    /// The build recipe file (the project config itself)
    pub fn recipe_file(&self) -> PathBuf {
        self.root.join(PROJECT_FILE)
    }

    /// Manifest directory resolved against the project root
    pub fn manifest_dir(&self) -> PathBuf {
        self.root.join(&self.config.build.manifest_dir)
    }

    /// Look up a service by name
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.config.services.iter().find(|s| s.name == name)
    }

    /// The service hosting test and lint runs
    pub fn verify_service(&self) -> SlipwayResult<&ServiceConfig> {
        match &self.config.verify.service {
            Some(name) => self
                .service(name)
                .ok_or_else(|| SlipwayError::ServiceUnknown(name.clone())),
            None => self.config.services.first().ok_or(SlipwayError::NoServices),
        }
    }
}
