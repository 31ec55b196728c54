//! Configuration for the memory engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::embedding::EMBEDDING_DIMENSIONS;
use crate::memory::imports::{DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_DEPTH, ImportOptions};
use crate::memory::retrieval::{SearchOptions, SearchScope};

/// Top-level configuration for the memory engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Import resolution settings.
    pub imports: ImportConfig,
    /// Index settings.
    pub index: IndexConfig,
    /// Default search settings.
    pub search: SearchConfig,
    /// Quality gate settings.
    pub lint: LintConfig,
}

impl EngineConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> MemoryResult<()> {
        if self.imports.allowed_extensions.is_empty() {
            return Err(MemoryError::InvalidConfig(
                "imports.allowed_extensions must not be empty".to_string(),
            ));
        }

        for extension in &self.imports.allowed_extensions {
            let bare = extension.trim_start_matches('.');
            if bare.is_empty() || bare.contains(['/', '\\', '.']) {
                return Err(MemoryError::InvalidConfig(format!(
                    "imports.allowed_extensions contains invalid entry {extension:?}"
                )));
            }
        }

        if self.imports.read_timeout_ms == Some(0) {
            return Err(MemoryError::InvalidConfig(
                "imports.read_timeout_ms must be > 0 when set".to_string(),
            ));
        }

        if self.index.dimensions == 0 {
            return Err(MemoryError::InvalidConfig(
                "index.dimensions must be > 0".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(MemoryError::InvalidConfig(
                "search.max_results must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.search.min_relevance_score) {
            return Err(MemoryError::InvalidConfig(
                "search.min_relevance_score must be in 0..=1".to_string(),
            ));
        }

        if !(0.0..=100.0).contains(&self.lint.min_score) {
            return Err(MemoryError::InvalidConfig(
                "lint.min_score must be in 0..=100".to_string(),
            ));
        }

        Ok(())
    }
}

/// Import resolution settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Maximum nesting depth below the root document.
    pub max_depth: usize,
    /// File extensions that may be imported.
    pub allowed_extensions: Vec<String>,
    /// Directory relative imports resolve against; importing file's directory when unset.
    pub base_path: Option<PathBuf>,
    /// Budget in milliseconds for a whole resolution call.
    pub read_timeout_ms: Option<u64>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            base_path: None,
            read_timeout_ms: None,
        }
    }
}

impl ImportConfig {
    /// Build per-call import options, arming the deadline from now.
    #[must_use]
    pub fn to_options(&self) -> ImportOptions {
        let mut options = ImportOptions {
            max_depth: self.max_depth,
            allowed_extensions: self.allowed_extensions.clone(),
            base_path: self.base_path.clone(),
            deadline: None,
        };
        if let Some(ms) = self.read_timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        options
    }
}

/// Index settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Vector dimensionality of the hash embedder.
    pub dimensions: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dimensions: EMBEDDING_DIMENSIONS,
        }
    }
}

/// Default search settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum results returned.
    pub max_results: usize,
    /// Minimum relevance score kept.
    pub min_relevance_score: f64,
    /// Attach a context sentence to each result.
    pub include_context: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 20,
            min_relevance_score: 0.1,
            include_context: true,
        }
    }
}

impl SearchConfig {
    /// Build search options from these defaults.
    #[must_use]
    pub const fn to_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.max_results,
            min_relevance_score: self.min_relevance_score,
            include_context: self.include_context,
            scope: SearchScope::All,
            time_range: None,
        }
    }
}

/// Quality gate settings for captured notes.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Lint notes before indexing them.
    pub gate_enabled: bool,
    /// Minimum lint score a note needs to be indexed.
    pub min_score: f64,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            gate_enabled: true,
            min_score: 50.0,
        }
    }
}
