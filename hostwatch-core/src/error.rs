//! Error types for configuration loading and report generation

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the allow-list configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config from {path}: {source}")]
    Load {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Empty host entry at allowed_hosts[{index}]")]
    EmptyHost { index: usize },

    #[error("Invalid host entry: {host:?}")]
    InvalidHost { host: String },
}

/// Which output file an [`ArtifactError`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Dump,
    Report,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Dump => write!(f, "JSON dump"),
            Artifact::Report => write!(f, "HTML report"),
        }
    }
}

/// Failure while producing a single artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to serialize sites data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to load template {path}: {source}")]
    TemplateLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to render template: {0}")]
    Render(#[from] minijinja::Error),
}

/// Failure of the shutdown dump, naming every artifact that could not be produced
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("JSON dump failed: {0}")]
    Dump(ArtifactError),

    #[error("HTML report failed: {0}")]
    Report(ArtifactError),

    #[error("JSON dump failed: {dump}; HTML report failed: {report}")]
    Both {
        dump: ArtifactError,
        report: ArtifactError,
    },
}

impl GenerationError {
    /// Artifacts that were not written
    pub fn failed_artifacts(&self) -> Vec<Artifact> {
        match self {
            GenerationError::Dump(_) => vec![Artifact::Dump],
            GenerationError::Report(_) => vec![Artifact::Report],
            GenerationError::Both { .. } => vec![Artifact::Dump, Artifact::Report],
        }
    }
}
