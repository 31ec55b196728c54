//! The indexed memory unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::core::metadata::{MemoryMetadata, MemorySource};

/// A memory as stored by the semantic index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryIndexEntry {
    /// Unique memory identifier supplied by the caller.
    pub id: String,
    /// Raw indexed text.
    pub content: String,
    /// Fixed-dimension, L2-normalized vector.
    pub vector: Vec<f32>,
    /// Normalized keywords in first-occurrence order.
    pub keywords: Vec<String>,
    /// Extracted entities in first-occurrence order.
    pub entities: Vec<String>,
    /// Caller metadata.
    #[serde(default)]
    pub metadata: MemoryMetadata,
    /// Time of the last index or update, serialized as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Provenance of the memory.
    #[serde(default)]
    pub source: MemorySource,
}

impl MemoryIndexEntry {
    /// Age of the entry relative to `now`, never negative.
    #[must_use]
    pub fn age_millis(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.timestamp)
            .num_milliseconds()
            .max(0)
    }

    /// Whether the entry's keyword list contains `keyword`.
    #[must_use]
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }
}
