//! Error types for template discovery and assembly.

use std::path::{Path, PathBuf};

use cfgen_core::CoreError;
use thiserror::Error;

/// Result type alias for build operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that can occur while discovering and assembling templates.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Failed to read {path:?}: {source}")]
    Discovery {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid template unit {path:?}: {message}")]
    InvalidUnit { path: PathBuf, message: String },

    #[error("Unknown generator [{name}] referenced by {path:?}")]
    UnknownGenerator { name: String, path: PathBuf },

    #[error("{0}")]
    DuplicateDefinition(String),

    #[error("Resource [{resource}] depends on unknown resource [{dependency}]")]
    UnresolvedDependency { resource: String, dependency: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BuildError {
    pub(crate) fn discovery(path: &Path, source: std::io::Error) -> Self {
        Self::Discovery {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn invalid_unit(path: &Path, message: impl Into<String>) -> Self {
        Self::InvalidUnit {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether the error came from reading the template tree.
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            Self::Discovery { .. } | Self::InvalidUnit { .. } | Self::UnknownGenerator { .. }
        )
    }
}
