//! Error types for the memory subsystem.

use std::path::PathBuf;

use thiserror::Error;

/// Memory subsystem error type.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No memory is indexed under the given id.
    #[error("memory not found: {0}")]
    NotFound(String),
    /// The root document of an import resolution could not be read.
    #[error("failed to read import root {path}: {source}")]
    ImportRead {
        /// Normalized path that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The import deadline elapsed before the root document was read.
    #[error("import deadline elapsed while reading {0}")]
    ImportTimeout(PathBuf),
    /// Snapshot contents are inconsistent or of an unsupported version.
    #[error("invalid index snapshot: {0}")]
    InvalidSnapshot(String),
    /// A lint rule check failed to run.
    #[error("lint rule {rule_id} failed: {message}")]
    LintRule {
        /// Rule that failed.
        rule_id: String,
        /// Failure description.
        message: String,
    },
    /// Content was rejected by the quality gate.
    #[error("quality gate rejected content (score {score:.1} < {min_score:.1})")]
    QualityGate {
        /// Lint score obtained.
        score: f64,
        /// Minimum score required.
        min_score: f64,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Regex compilation error.
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MemoryError {
    /// Build a lint rule failure.
    #[must_use]
    pub fn lint_rule(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LintRule {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Check whether this error reports a missing memory id.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convenience result alias for memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
