//! Memory subsystem.
//!
//! Organized into:
//! - `core`: Configuration, errors, metadata, entries, and tracing setup
//! - `imports`: `@path` import resolution with cycle and depth safety
//! - `ingest`: Keyword and entity extraction
//! - `embedding`: Fixed-dimension vector abstraction and the hash embedder
//! - `index`: Inverted index, mutation operations, and snapshots
//! - `retrieval`: Ranked search, context sentences, and trending keywords
//! - `lint`: Rule registry, quality metrics, and the memory linter
//! - `engine`: Façade wiring the components together

pub mod core;
pub mod embedding;
pub mod engine;
pub mod imports;
pub mod index;
pub mod ingest;
pub mod lint;
pub mod retrieval;

// Re-export commonly used types for convenience
pub use core::{
    EngineConfig, ImportConfig, IndexConfig, LintConfig, MemoryError, MemoryIndexEntry,
    MemoryMetadata, MemoryResult, MemorySource, SearchConfig, init_tracing,
};
pub use embedding::{EMBEDDING_DIMENSIONS, Embedder, HashEmbedder};
pub use engine::{IngestedDocument, MemoryEngine};
pub use imports::{ImportOptions, ImportResolver, ImportedContent};
pub use index::{IndexSnapshot, IndexStats, SemanticIndex, SnapshotMetadata};
pub use ingest::{EntityExtractor, KeywordExtractor};
pub use lint::{
    LintCategory, LintIssue, LintResult, LintRule, LintScope, LintSeverity, MemoryLinter,
    QualityMetrics, RuleCheck,
};
pub use retrieval::{SearchOptions, SearchResult, SearchScope, TimeRange, TrendingKeyword};
