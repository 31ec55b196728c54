//! Semantic index: entry store, posting maps, and mutation operations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::memory::core::entry::MemoryIndexEntry;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::metadata::{MemoryMetadata, MemorySource};
use crate::memory::embedding::embedder::{Embedder, HashEmbedder};
use crate::memory::index::postings::PostingMap;
use crate::memory::ingest::entity_extractor::EntityExtractor;
use crate::memory::ingest::keywords::KeywordExtractor;

/// Keyword, entity and vector representation of a text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextAnalysis {
    /// Normalized keywords in first-occurrence order.
    pub keywords: Vec<String>,
    /// Entities in order of appearance.
    pub entities: Vec<String>,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

/// Index size counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Indexed memories.
    pub memories: usize,
    /// Distinct keywords with postings.
    pub keywords: usize,
    /// Distinct entities with postings.
    pub entities: usize,
}

/// In-memory semantic index over memories.
///
/// Owns its entries and posting maps; each instance is independent. Callers
/// serialize mutations of the same id.
pub struct SemanticIndex {
    pub(crate) entries: BTreeMap<String, MemoryIndexEntry>,
    pub(crate) keyword_postings: PostingMap,
    pub(crate) entity_postings: PostingMap,
    pub(crate) keyword_extractor: KeywordExtractor,
    pub(crate) entity_extractor: EntityExtractor,
    pub(crate) embedder: Box<dyn Embedder>,
}

impl SemanticIndex {
    /// Create an empty index using the default hash embedder.
    ///
    /// # Errors
    /// Returns an error if the text analysis patterns are invalid.
    pub fn new() -> MemoryResult<Self> {
        Self::with_embedder(Box::new(HashEmbedder::default()))
    }

    /// Create an empty index with a custom embedder.
    ///
    /// # Errors
    /// Returns an error if the text analysis patterns are invalid.
    pub fn with_embedder(embedder: Box<dyn Embedder>) -> MemoryResult<Self> {
        Ok(Self {
            entries: BTreeMap::new(),
            keyword_postings: PostingMap::new(),
            entity_postings: PostingMap::new(),
            keyword_extractor: KeywordExtractor::new()?,
            entity_extractor: EntityExtractor::new()?,
            embedder,
        })
    }

    /// Compute the keyword, entity and vector representation of `text`.
    #[must_use]
    pub fn analyze(&self, text: &str) -> TextAnalysis {
        let keywords = self.keyword_extractor.extract(text);
        let entities = self.entity_extractor.extract_values(text);
        let vector = self.embedder.embed(text, &keywords);
        TextAnalysis {
            keywords,
            entities,
            vector,
        }
    }

    /// Index `content` under `id`, timestamped now.
    ///
    /// An existing entry with the same id is replaced.
    pub fn index_memory(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: MemoryMetadata,
        source: MemorySource,
    ) {
        self.index_memory_at(id, content, metadata, source, Utc::now());
    }

    /// Index `content` under `id` with an explicit timestamp.
    pub fn index_memory_at(
        &mut self,
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: MemoryMetadata,
        source: MemorySource,
        timestamp: DateTime<Utc>,
    ) {
        let id = id.into();
        let content = content.into();

        if let Some(previous) = self.entries.remove(&id) {
            debug!(id = %id, "Replacing existing memory");
            self.remove_postings(&previous);
        }

        let analysis = self.analyze(&content);
        let entry = MemoryIndexEntry {
            id: id.clone(),
            content,
            vector: analysis.vector,
            keywords: analysis.keywords,
            entities: analysis.entities,
            metadata,
            timestamp,
            source,
        };

        self.insert_postings(&entry);
        debug!(
            id = %id,
            source = entry.source.as_str(),
            keywords = entry.keywords.len(),
            entities = entry.entities.len(),
            "Indexed memory"
        );
        self.entries.insert(id, entry);
    }

    /// Replace the content of an existing memory.
    ///
    /// Metadata is replaced when given, kept otherwise; the source is kept and
    /// the timestamp refreshed.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn update_memory(
        &mut self,
        id: &str,
        content: impl Into<String>,
        metadata: Option<MemoryMetadata>,
    ) -> MemoryResult<&MemoryIndexEntry> {
        let Some(previous) = self.entries.remove(id) else {
            return Err(MemoryError::NotFound(id.to_string()));
        };
        self.remove_postings(&previous);

        let content = content.into();
        let analysis = self.analyze(&content);
        let entry = MemoryIndexEntry {
            id: previous.id,
            content,
            vector: analysis.vector,
            keywords: analysis.keywords,
            entities: analysis.entities,
            metadata: metadata.unwrap_or(previous.metadata),
            timestamp: Utc::now(),
            source: previous.source,
        };
        self.insert_postings(&entry);
        debug!(id = %id, keywords = entry.keywords.len(), "Updated memory");

        self.entries.insert(id.to_string(), entry);
        self.entries
            .get(id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))
    }

    /// Remove a memory and all of its postings.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn remove_memory(&mut self, id: &str) -> MemoryResult<MemoryIndexEntry> {
        let Some(entry) = self.entries.remove(id) else {
            return Err(MemoryError::NotFound(id.to_string()));
        };
        self.remove_postings(&entry);
        debug!(id = %id, "Removed memory");
        Ok(entry)
    }

    /// Drop every entry and posting.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.keyword_postings.clear();
        self.entity_postings.clear();
        info!("Cleared semantic index");
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MemoryIndexEntry> {
        self.entries.get(id)
    }

    /// Whether an entry exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Keyword posting map.
    #[must_use]
    pub const fn keyword_postings(&self) -> &PostingMap {
        &self.keyword_postings
    }

    /// Entity posting map.
    #[must_use]
    pub const fn entity_postings(&self) -> &PostingMap {
        &self.entity_postings
    }

    /// Size counters.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            memories: self.entries.len(),
            keywords: self.keyword_postings.len(),
            entities: self.entity_postings.len(),
        }
    }

    pub(crate) fn insert_postings(&mut self, entry: &MemoryIndexEntry) {
        self.keyword_postings.insert_all(&entry.keywords, &entry.id);
        self.entity_postings.insert_all(&entry.entities, &entry.id);
    }

    pub(crate) fn remove_postings(&mut self, entry: &MemoryIndexEntry) {
        self.keyword_postings.remove_all(&entry.keywords, &entry.id);
        self.entity_postings.remove_all(&entry.entities, &entry.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(entries: &[(&str, &str)]) -> SemanticIndex {
        let mut index = SemanticIndex::new().unwrap();
        for (id, content) in entries {
            index.index_memory(*id, *content, MemoryMetadata::new(), MemorySource::Manual);
        }
        index
    }

    #[test]
    fn test_index_populates_postings() {
        let index = index_with(&[("m1", "Redis cache eviction uses LRU")]);
        let entry = index.get("m1").unwrap();

        assert_eq!(entry.vector.len(), 384);
        assert!(index.keyword_postings().contains("cache", "m1"));
        assert!(index.entity_postings().contains("LRU", "m1"));
        assert_eq!(index.stats().memories, 1);
    }

    #[test]
    fn test_update_leaves_no_stale_postings() {
        let mut index = index_with(&[
            ("m1", "Redis cache eviction policy"),
            ("m2", "Cache warming on boot"),
        ]);

        index
            .update_memory("m1", "Postgres vacuum schedule", None)
            .unwrap();

        for term in index.keyword_postings().terms_for("m1") {
            assert!(index.get("m1").unwrap().has_keyword(term), "stale term {term}");
        }
        assert!(!index.keyword_postings().contains("cache", "m1"));
        assert!(index.keyword_postings().contains("cache", "m2"));
        assert!(index.keyword_postings().get("eviction").is_none());
        assert!(index.keyword_postings().contains("vacuum", "m1"));
    }

    #[test]
    fn test_update_keeps_shared_terms() {
        let mut index = index_with(&[("m1", "cache eviction policy")]);
        index
            .update_memory("m1", "cache warming policy", None)
            .unwrap();

        assert!(index.keyword_postings().contains("cache", "m1"));
        assert!(index.keyword_postings().contains("policy", "m1"));
        assert!(index.keyword_postings().get("eviction").is_none());
    }

    #[test]
    fn test_update_replaces_metadata_only_when_given() {
        let mut index = SemanticIndex::new().unwrap();
        index.index_memory(
            "m1",
            "first version",
            MemoryMetadata::new().with_priority("high"),
            MemorySource::Note,
        );

        let kept = index.update_memory("m1", "second version", None).unwrap();
        assert!(kept.metadata.is_high_priority());
        assert_eq!(kept.source, MemorySource::Note);

        let replaced = index
            .update_memory("m1", "third version", Some(MemoryMetadata::new()))
            .unwrap();
        assert!(replaced.metadata.is_empty());
    }

    #[test]
    fn test_update_unknown_id_fails() {
        let mut index = SemanticIndex::new().unwrap();
        let err = index.update_memory("ghost", "content", None).unwrap_err();
        assert!(err.is_not_found());
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_prunes_postings() {
        let mut index = index_with(&[
            ("m1", "Kubernetes rollout strategy"),
            ("m2", "rollout checklist"),
        ]);

        let removed = index.remove_memory("m1").unwrap();
        assert_eq!(removed.id, "m1");
        assert!(index.keyword_postings().terms_for("m1").is_empty());
        assert!(index.entity_postings().terms_for("m1").is_empty());
        assert!(index.keyword_postings().get("strategy").is_none());
        assert!(index.keyword_postings().contains("rollout", "m2"));
        assert!(index.remove_memory("m1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_reindex_same_id_replaces_entry() {
        let mut index = index_with(&[("m1", "alpha bravo")]);
        index.index_memory("m1", "charlie delta", MemoryMetadata::new(), MemorySource::Manual);

        assert_eq!(index.len(), 1);
        assert!(index.keyword_postings().get("alpha").is_none());
        assert!(index.keyword_postings().contains("charlie", "m1"));
    }

    #[test]
    fn test_empty_content_has_zero_vector() {
        let index = index_with(&[("m1", "")]);
        let entry = index.get("m1").unwrap();
        assert!(entry.keywords.is_empty());
        assert!(entry.vector.iter().all(|v| *v == 0.0));
    }
}
