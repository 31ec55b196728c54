//! Memory engine orchestration.

use std::path::Path;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::memory::core::config::EngineConfig;
use crate::memory::core::entry::MemoryIndexEntry;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::metadata::{MemoryMetadata, MemorySource};
use crate::memory::embedding::embedder::HashEmbedder;
use crate::memory::imports::resolver::{ImportResolver, compose};
use crate::memory::index::semantic_index::SemanticIndex;
use crate::memory::lint::linter::{LintResult, MemoryLinter};
use crate::memory::retrieval::search::{SearchOptions, SearchResult};
use crate::memory::retrieval::trending::TrendingKeyword;

/// Result of ingesting a document with its imports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedDocument {
    /// Id the composed document was indexed under (the normalized root path).
    pub id: String,
    /// Number of files composed into the document.
    pub files: usize,
}

/// Owns one resolver, one linter and one index, wired by configuration.
pub struct MemoryEngine {
    config: EngineConfig,
    resolver: ImportResolver,
    linter: MemoryLinter,
    index: SemanticIndex,
}

impl MemoryEngine {
    /// Create a new memory engine.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a text pattern
    /// fails to compile.
    pub fn new(config: EngineConfig) -> MemoryResult<Self> {
        config.validate()?;
        let embedder = HashEmbedder::new(config.index.dimensions);
        let index = SemanticIndex::with_embedder(Box::new(embedder))?;

        info!(
            dimensions = config.index.dimensions,
            max_depth = config.imports.max_depth,
            "Memory engine ready"
        );

        Ok(Self {
            config,
            resolver: ImportResolver::new()?,
            linter: MemoryLinter::new()?,
            index,
        })
    }

    /// Resolve a document and its imports, then index the composed text
    /// under the root path.
    ///
    /// Every call reads the document tree afresh, so re-ingesting picks up
    /// edits and replaces the previous entry.
    ///
    /// # Errors
    /// Returns an error if the root document cannot be read.
    pub async fn ingest_document(
        &mut self,
        path: impl AsRef<Path>,
    ) -> MemoryResult<IngestedDocument> {
        let options = self.config.imports.to_options();
        self.resolver.clear_cache();
        let resolved = self
            .resolver
            .resolve_imports(path.as_ref(), &options)
            .await?;
        let Some(root) = resolved.first() else {
            return Err(MemoryError::NotFound(path.as_ref().display().to_string()));
        };

        let id = root.path.display().to_string();
        let files = resolved.len();
        let imports: Vec<String> = resolved
            .iter()
            .skip(1)
            .map(|node| node.path.display().to_string())
            .collect();
        let metadata = MemoryMetadata::new()
            .with("path", id.clone())
            .with("imports", imports);

        self.index
            .index_memory(id.clone(), compose(&resolved), metadata, MemorySource::Import);
        info!(id = %id, files, "Ingested document");

        Ok(IngestedDocument { id, files })
    }

    /// Lint a note and index it when it passes the quality gate.
    ///
    /// # Errors
    /// Returns `QualityGate` if the gate is enabled and the note scores below
    /// the configured minimum.
    pub fn capture_note(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: MemoryMetadata,
    ) -> MemoryResult<LintResult> {
        let id = id.into();
        let content = content.into();
        let lint = self.linter.lint_memory(&content);

        if self.config.lint.gate_enabled && lint.score < self.config.lint.min_score {
            warn!(
                id = %id,
                score = lint.score,
                min_score = self.config.lint.min_score,
                summary = %lint.summary,
                "Note rejected by quality gate"
            );
            return Err(MemoryError::QualityGate {
                score: lint.score,
                min_score: self.config.lint.min_score,
            });
        }

        let metadata = metadata.with("quality_score", lint.score);
        self.index
            .index_memory(id.clone(), content, metadata, MemorySource::Note);
        debug!(id = %id, score = lint.score, "Captured note");
        Ok(lint)
    }

    /// Index the summary of a finished task.
    pub fn record_task_result(
        &mut self,
        id: impl Into<String>,
        summary: impl Into<String>,
        metadata: MemoryMetadata,
    ) {
        self.index
            .index_memory(id, summary, metadata, MemorySource::TaskResult);
    }

    /// Search with the configured default options.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        self.index.search(query, &self.config.search.to_options())
    }

    /// Search with explicit options.
    #[must_use]
    pub fn search_with(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        self.index.search(query, options)
    }

    /// Memories similar to `id`, itself included.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn find_similar(&self, id: &str) -> MemoryResult<Vec<SearchResult>> {
        self.index
            .find_similar(id, &self.config.search.to_options())
    }

    /// Keywords trending over the trailing `window`.
    #[must_use]
    pub fn trending(&self, window: Duration) -> Vec<TrendingKeyword> {
        self.index.trending_keywords(window)
    }

    /// Replace the content of a memory.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn update(
        &mut self,
        id: &str,
        content: impl Into<String>,
        metadata: Option<MemoryMetadata>,
    ) -> MemoryResult<&MemoryIndexEntry> {
        self.index.update_memory(id, content, metadata)
    }

    /// Remove a memory.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn remove(&mut self, id: &str) -> MemoryResult<MemoryIndexEntry> {
        self.index.remove_memory(id)
    }

    /// Write the index snapshot as JSON to `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> MemoryResult<()> {
        let path = path.as_ref();
        let json = self.index.export_json()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), memories = self.index.len(), "Saved index snapshot");
        Ok(())
    }

    /// Replace the index with the JSON snapshot stored at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or holds an invalid snapshot.
    pub async fn load_snapshot(&mut self, path: impl AsRef<Path>) -> MemoryResult<()> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        self.index.import_json(&json)?;
        info!(path = %path.display(), memories = self.index.len(), "Loaded index snapshot");
        Ok(())
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Underlying index.
    #[must_use]
    pub const fn index(&self) -> &SemanticIndex {
        &self.index
    }

    /// Mutable access to the underlying index.
    pub const fn index_mut(&mut self) -> &mut SemanticIndex {
        &mut self.index
    }

    /// Import resolver and its cache.
    pub const fn resolver_mut(&mut self) -> &mut ImportResolver {
        &mut self.resolver
    }

    /// Quality linter.
    #[must_use]
    pub const fn linter(&self) -> &MemoryLinter {
        &self.linter
    }

    /// Mutable access to the linter registry.
    pub const fn linter_mut(&mut self) -> &mut MemoryLinter {
        &mut self.linter
    }
}
