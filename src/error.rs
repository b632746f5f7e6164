//! Error types for slipway
//!
//! All modules use `SlipwayResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for slipway operations
pub type SlipwayResult<T> = Result<T, SlipwayError>;

/// All errors that can occur in slipway
#[derive(Error, Debug)]
pub enum SlipwayError {
    // Build errors
    #[error("Dependency manifest not found for {mode} mode: {path}")]
    ManifestNotFound { mode: String, path: PathBuf },

    #[error("Image build failed for service {service}:\n{output}")]
    StageBuildFailure { service: String, output: String },

    #[error("Failed to write build marker {path}: {source}")]
    MarkerWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Compose errors
    #[error("Service {service} exited unexpectedly with code {code}")]
    ComposeFailure { service: String, code: i32 },

    #[error("Service {service} failed to start: {reason}")]
    ServiceStart { service: String, reason: String },

    #[error("Unknown service: {0}")]
    ServiceUnknown(String),

    #[error("No services defined in project configuration")]
    NoServices,

    // Engine errors
    #[error("Container engine not found: {binary}")]
    EngineNotFound { binary: String },

    // Verification errors
    #[error("Tests failed with exit code {0}")]
    TestsFailed(i32),

    #[error("Lint found violations (exit code {0})")]
    LintFailed(i32),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command execution error: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SlipwayError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EngineNotFound { .. } => {
                Some("Install Docker or set [engine] binary in slipway.toml")
            }
            Self::ManifestNotFound { .. } => {
                Some("Create the manifest file under the manifest directory")
            }
            Self::MarkerWriteFailure { .. } => {
                Some("Check permissions on the project .slipway directory")
            }
            Self::NoServices => Some("Run: slipway init"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SlipwayError::ManifestNotFound {
            mode: "development".to_string(),
            path: PathBuf::from("requirements/tests.txt"),
        };
        assert!(err.to_string().contains("development"));
        assert!(err.to_string().contains("tests.txt"));
    }

    #[test]
    fn error_hint() {
        let err = SlipwayError::EngineNotFound {
            binary: "docker".to_string(),
        };
        assert!(err.hint().unwrap().contains("Install Docker"));
    }

    #[test]
    fn compose_failure_names_service() {
        let err = SlipwayError::ComposeFailure {
            service: "loader".to_string(),
            code: 137,
        };
        assert!(err.to_string().contains("loader"));
        assert!(err.to_string().contains("137"));
    }
}
