//! Relevance scoring for index entries.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::memory::core::entry::MemoryIndexEntry;
use crate::memory::embedding::embedder::cosine_similarity;
use crate::memory::index::semantic_index::TextAnalysis;

/// Weight of the vector cosine similarity.
pub const VECTOR_WEIGHT: f64 = 0.4;
/// Weight of the keyword Jaccard overlap.
pub const KEYWORD_WEIGHT: f64 = 0.3;
/// Weight of the query entity coverage.
pub const ENTITY_WEIGHT: f64 = 0.15;
/// Weight of the literal substring match.
pub const SUBSTRING_WEIGHT: f64 = 0.1;
/// Weight of the recency decay.
pub const RECENCY_WEIGHT: f64 = 0.05;
/// Multiplier applied to `priority: "high"` memories.
pub const HIGH_PRIORITY_BOOST: f64 = 1.2;
/// Recency decay constant (30 days).
pub const RECENCY_HORIZON_MILLIS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Per-component score of one entry against one query.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreBreakdown {
    /// Cosine similarity of the vectors.
    pub similarity: f64,
    /// Jaccard overlap of the keyword sets.
    pub keyword_overlap: f64,
    /// Fraction of query entities present in the entry.
    pub entity_overlap: f64,
    /// 1.0 when the query occurs literally in the content.
    pub substring: f64,
    /// Recency decay in `(0, 1]`.
    pub recency: f64,
    /// Whether the high-priority boost applied.
    pub boosted: bool,
    /// Final score clamped to `[0, 1]`.
    pub score: f64,
}

/// Score `entry` against an analyzed query.
#[must_use]
pub fn score_entry(
    entry: &MemoryIndexEntry,
    query: &TextAnalysis,
    query_text: &str,
    now: DateTime<Utc>,
) -> ScoreBreakdown {
    let similarity = cosine_similarity(&query.vector, &entry.vector);
    let keyword_overlap = jaccard(&query.keywords, &entry.keywords);
    let entity_overlap = precision(&query.entities, &entry.entities);
    let substring = if contains_ignore_case(&entry.content, query_text) {
        1.0
    } else {
        0.0
    };
    let recency = recency_score(entry.age_millis(now));

    let mut score = RECENCY_WEIGHT.mul_add(
        recency,
        SUBSTRING_WEIGHT.mul_add(
            substring,
            ENTITY_WEIGHT.mul_add(
                entity_overlap,
                KEYWORD_WEIGHT.mul_add(keyword_overlap, VECTOR_WEIGHT * similarity),
            ),
        ),
    );
    let boosted = entry.metadata.is_high_priority();
    if boosted {
        score *= HIGH_PRIORITY_BOOST;
    }

    ScoreBreakdown {
        similarity,
        keyword_overlap,
        entity_overlap,
        substring,
        recency,
        boosted,
        score: score.clamp(0.0, 1.0),
    }
}

/// `|a ∩ b| / |a ∪ b|`, zero when both are empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn jaccard(a: &[String], b: &[String]) -> f64 {
    let left: HashSet<&str> = a.iter().map(String::as_str).collect();
    let right: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Fraction of `wanted` found in `present`, zero when `wanted` is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn precision(wanted: &[String], present: &[String]) -> f64 {
    let wanted: HashSet<&str> = wanted.iter().map(String::as_str).collect();
    if wanted.is_empty() {
        return 0.0;
    }
    let present: HashSet<&str> = present.iter().map(String::as_str).collect();
    wanted.intersection(&present).count() as f64 / wanted.len() as f64
}

/// `exp(-age / 30 days)`; negative ages count as zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn recency_score(age_millis: i64) -> f64 {
    let age = age_millis.max(0) as f64;
    (-age / RECENCY_HORIZON_MILLIS as f64).exp()
}

fn contains_ignore_case(content: &str, query: &str) -> bool {
    if query.trim().is_empty() {
        return false;
    }
    content.to_lowercase().contains(&query.to_lowercase())
}
