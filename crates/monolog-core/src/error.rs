//! Error types for monolog

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using MonologError
pub type Result<T> = std::result::Result<T, MonologError>;

/// Main error type for monolog operations
#[derive(Debug, Error)]
pub enum MonologError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Dependency graph errors
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// No `.git` directory found walking up from the start path
    #[error("Git repository not found at or above {0}")]
    RepositoryNotFound(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Tag template could not be compiled
    #[error("Invalid tag template '{template}': {reason}")]
    InvalidTagTemplate { template: String, reason: String },

    /// Revision could not be resolved
    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Dependency graph errors
#[derive(Debug, Error)]
pub enum GraphError {
    /// Two manifests declare the same package name
    #[error("Duplicate package '{name}' declared in {first} and {second}")]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Manifest could not be interpreted as a package
    #[error("Invalid manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    /// Package not present in the graph
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// A manifest read task failed to complete
    #[error("Manifest loader failed: {0}")]
    LoaderFailed(String),
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Invalid bump severity name
    #[error("Invalid bump severity: {0}")]
    InvalidSeverity(String),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// A commit grammar failed to compile
    #[error("Invalid commit grammar '{pattern}': {reason}")]
    InvalidGrammar { pattern: String, reason: String },
}

impl MonologError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}
