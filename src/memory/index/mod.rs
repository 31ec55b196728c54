//! Semantic index storage, mutation, and snapshots.

pub mod postings;
pub mod semantic_index;
pub mod snapshot;

pub use postings::PostingMap;
pub use semantic_index::{IndexStats, SemanticIndex, TextAnalysis};
pub use snapshot::{IndexSnapshot, SNAPSHOT_VERSION, SnapshotMetadata};
