//! JSON snapshot export and import for the semantic index.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::memory::core::entry::MemoryIndexEntry;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::index::semantic_index::SemanticIndex;

/// Snapshot format version written by this crate.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Full serialized state of a [`SemanticIndex`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    /// Every indexed entry.
    pub memories: Vec<MemoryIndexEntry>,
    /// Keyword postings.
    pub keywords: BTreeMap<String, Vec<String>>,
    /// Entity postings.
    pub entities: BTreeMap<String, Vec<String>>,
    /// Export information.
    pub metadata: SnapshotMetadata,
}

/// Snapshot header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Export time, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub exported: DateTime<Utc>,
    /// Format version.
    pub version: String,
}

impl SemanticIndex {
    /// Export the whole index.
    #[must_use]
    pub fn export_index(&self) -> IndexSnapshot {
        IndexSnapshot {
            memories: self.entries.values().cloned().collect(),
            keywords: self.keyword_postings.to_map(),
            entities: self.entity_postings.to_map(),
            metadata: SnapshotMetadata {
                exported: Utc::now(),
                version: SNAPSHOT_VERSION.to_string(),
            },
        }
    }

    /// Replace the index contents with a snapshot.
    ///
    /// Postings are rebuilt from the entries; posting maps in the snapshot
    /// that disagree with them are reported and ignored. The index is left
    /// untouched when validation fails.
    ///
    /// # Errors
    /// Returns `InvalidSnapshot` for an unsupported version, a vector of the
    /// wrong dimension, or a duplicated id.
    pub fn import_index(&mut self, snapshot: IndexSnapshot) -> MemoryResult<()> {
        if major_version(&snapshot.metadata.version) != major_version(SNAPSHOT_VERSION) {
            return Err(MemoryError::InvalidSnapshot(format!(
                "unsupported version {}",
                snapshot.metadata.version
            )));
        }

        let dimensions = self.embedder.dimensions();
        let mut seen = HashSet::new();
        for entry in &snapshot.memories {
            if entry.vector.len() != dimensions {
                return Err(MemoryError::InvalidSnapshot(format!(
                    "memory {} has {} dimensions, expected {dimensions}",
                    entry.id,
                    entry.vector.len()
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(MemoryError::InvalidSnapshot(format!(
                    "duplicate memory id {}",
                    entry.id
                )));
            }
        }

        self.clear();
        for entry in snapshot.memories {
            self.insert_postings(&entry);
            self.entries.insert(entry.id.clone(), entry);
        }

        if self.keyword_postings.to_map() != snapshot.keywords
            || self.entity_postings.to_map() != snapshot.entities
        {
            warn!("Snapshot posting maps disagree with its entries; rebuilt from entries");
        }

        info!(
            memories = self.entries.len(),
            exported = %snapshot.metadata.exported,
            "Imported index snapshot"
        );
        Ok(())
    }

    /// Export the index as a JSON string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> MemoryResult<String> {
        Ok(serde_json::to_string(&self.export_index())?)
    }

    /// Replace the index contents from a JSON snapshot string.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the snapshot is invalid.
    pub fn import_json(&mut self, json: &str) -> MemoryResult<()> {
        let snapshot: IndexSnapshot = serde_json::from_str(json)?;
        self.import_index(snapshot)
    }
}

fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::core::metadata::{MemoryMetadata, MemorySource};
    use crate::memory::retrieval::SearchOptions;
    use chrono::Duration;

    fn sample_index(now: DateTime<Utc>) -> SemanticIndex {
        let mut index = SemanticIndex::new().unwrap();
        index.index_memory_at(
            "m1",
            "Use `npm test` to run tests before deploying to production",
            MemoryMetadata::new(),
            MemorySource::Note,
            now - Duration::hours(2),
        );
        index.index_memory_at(
            "m2",
            "Deployment pipeline failed because of missing environment variable",
            MemoryMetadata::new().with_priority("high"),
            MemorySource::TaskResult,
            now - Duration::days(3),
        );
        index.index_memory_at(
            "m3",
            "Ask Grace Hopper on ops@example.com about the CI cache",
            MemoryMetadata::new().with("important", true),
            MemorySource::Import,
            now - Duration::days(20),
        );
        index
    }

    #[test]
    fn test_round_trip_reproduces_search() {
        let now = Utc::now();
        let original = sample_index(now);
        let json = original.export_json().unwrap();

        let mut restored = SemanticIndex::new().unwrap();
        restored.import_json(&json).unwrap();

        let options = SearchOptions::default().with_min_relevance_score(0.0);
        for query in ["deploy tests", "CI cache", "environment", "nothing matches zzz"] {
            let before = original.search_at(query, &options, now);
            let after = restored.search_at(query, &options, now);
            assert_eq!(before.len(), after.len(), "query {query}");
            for (a, b) in before.iter().zip(&after) {
                assert_eq!(a.id, b.id);
                assert!((a.relevance_score - b.relevance_score).abs() < 1e-9);
                assert_eq!(a.context, b.context);
            }
        }
        assert_eq!(original.stats(), restored.stats());
    }

    #[test]
    fn test_snapshot_shape() {
        let index = sample_index(Utc::now());
        let value = serde_json::to_value(index.export_index()).unwrap();

        assert_eq!(value["metadata"]["version"], "1.0.0");
        assert!(value["metadata"]["exported"].is_i64());
        assert!(value["memories"][0]["timestamp"].is_i64());
        assert_eq!(value["keywords"]["deploy"], serde_json::json!(["m1", "m2"]));
        assert_eq!(value["entities"]["CI"], serde_json::json!(["m3"]));
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        let index = sample_index(Utc::now());
        let mut snapshot = index.export_index();
        snapshot.memories[0].vector.truncate(10);

        let mut target = SemanticIndex::new().unwrap();
        target.index_memory("keep", "existing entry", MemoryMetadata::new(), MemorySource::Manual);
        let err = target.import_index(snapshot).unwrap_err();

        assert!(matches!(err, MemoryError::InvalidSnapshot(_)));
        assert!(target.contains("keep"));
    }

    #[test]
    fn test_rejects_unknown_major_version() {
        let index = sample_index(Utc::now());
        let mut snapshot = index.export_index();
        snapshot.metadata.version = "2.0.0".to_string();

        let mut target = SemanticIndex::new().unwrap();
        assert!(target.import_index(snapshot).is_err());
    }

    #[test]
    fn test_import_rebuilds_postings_from_entries() {
        let index = sample_index(Utc::now());
        let mut snapshot = index.export_index();
        snapshot.keywords.clear();

        let mut target = SemanticIndex::new().unwrap();
        target.import_index(snapshot).unwrap();
        assert!(target.keyword_postings().contains("deploy", "m1"));
    }
}
