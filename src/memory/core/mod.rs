//! Core memory types: configuration, errors, metadata, and entries.

pub mod config;
pub mod entry;
pub mod errors;
pub mod metadata;
pub mod telemetry;

pub use config::{EngineConfig, ImportConfig, IndexConfig, LintConfig, SearchConfig};
pub use entry::MemoryIndexEntry;
pub use errors::{MemoryError, MemoryResult};
pub use metadata::{MemoryMetadata, MemorySource};
pub use telemetry::init_tracing;
