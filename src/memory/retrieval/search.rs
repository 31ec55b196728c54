//! Query-time search over the semantic index.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::core::entry::MemoryIndexEntry;
use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::metadata::{MemoryMetadata, MemorySource};
use crate::memory::index::semantic_index::{SemanticIndex, TextAnalysis};
use crate::memory::retrieval::context::best_sentence;
use crate::memory::retrieval::ranking::{jaccard, precision, score_entry};

/// Age limit of the `recent` scope.
pub const RECENT_SCOPE_DAYS: i64 = 7;

/// Which entries a search considers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Every entry.
    #[default]
    All,
    /// Entries at most seven days old.
    Recent,
    /// Entries with `priority: "high"` or a truthy `important` flag.
    Important,
}

/// Inclusive timestamp window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Earliest accepted timestamp.
    pub start: DateTime<Utc>,
    /// Latest accepted timestamp.
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a window.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `timestamp` lies inside the window, bounds included.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Search tuning knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Maximum number of results.
    pub max_results: usize,
    /// Results scoring below this are dropped.
    pub min_relevance_score: f64,
    /// Attach the best matching sentence to each result.
    pub include_context: bool,
    /// Entry filter.
    pub scope: SearchScope,
    /// Optional timestamp filter.
    pub time_range: Option<TimeRange>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 20,
            min_relevance_score: 0.1,
            include_context: true,
            scope: SearchScope::All,
            time_range: None,
        }
    }
}

impl SearchOptions {
    /// Set the result cap.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the score threshold.
    #[must_use]
    pub const fn with_min_relevance_score(mut self, score: f64) -> Self {
        self.min_relevance_score = score;
        self
    }

    /// Toggle context sentences.
    #[must_use]
    pub const fn with_context(mut self, include: bool) -> Self {
        self.include_context = include;
        self
    }

    /// Set the scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Restrict results to a timestamp window.
    #[must_use]
    pub const fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    fn admits(&self, entry: &MemoryIndexEntry, now: DateTime<Utc>) -> bool {
        if self
            .time_range
            .is_some_and(|range| !range.contains(entry.timestamp))
        {
            return false;
        }
        match self.scope {
            SearchScope::All => true,
            SearchScope::Recent => {
                entry.age_millis(now) <= Duration::days(RECENT_SCOPE_DAYS).num_milliseconds()
            }
            SearchScope::Important => {
                entry.metadata.is_high_priority() || entry.metadata.is_important()
            }
        }
    }
}

/// One ranked hit.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    /// Memory id.
    pub id: String,
    /// Full memory content.
    pub content: String,
    /// Score in `[0, 1]`.
    pub relevance_score: f64,
    /// Memory metadata.
    pub metadata: MemoryMetadata,
    /// Best matching sentence, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Memory provenance.
    pub source: MemorySource,
    /// Memory timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl SearchResult {
    fn from_entry(entry: &MemoryIndexEntry, relevance_score: f64, context: Option<String>) -> Self {
        Self {
            id: entry.id.clone(),
            content: entry.content.clone(),
            relevance_score,
            metadata: entry.metadata.clone(),
            context,
            source: entry.source,
            timestamp: entry.timestamp,
        }
    }
}

impl SemanticIndex {
    /// Rank memories against `query`.
    #[must_use]
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        self.search_at(query, options, Utc::now())
    }

    /// Rank memories against `query` as of `now`.
    ///
    /// Candidates are the entries sharing a keyword or entity with the
    /// query; when none do, the whole index is scored.
    #[must_use]
    pub fn search_at(
        &self,
        query: &str,
        options: &SearchOptions,
        now: DateTime<Utc>,
    ) -> Vec<SearchResult> {
        let analysis = self.analyze(query);
        let candidates = self.candidates(&analysis);

        let mut scored: Vec<(f64, &MemoryIndexEntry)> = candidates
            .into_iter()
            .filter_map(|id| self.entries.get(id))
            .filter(|entry| options.admits(entry, now))
            .map(|entry| (score_entry(entry, &analysis, query, now).score, entry))
            .filter(|(score, _)| *score >= options.min_relevance_score)
            .collect();
        sort_ranked(&mut scored);
        scored.truncate(options.max_results);

        debug!(query = %query, results = scored.len(), "Searched memories");

        scored
            .into_iter()
            .map(|(score, entry)| {
                let context = if options.include_context {
                    best_sentence(&self.keyword_extractor, &entry.content, &analysis.keywords)
                } else {
                    None
                };
                SearchResult::from_entry(entry, score, context)
            })
            .collect()
    }

    /// Search using the stored content of `id` as the query.
    ///
    /// The entry itself is part of the results.
    ///
    /// # Errors
    /// Returns `NotFound` if no memory has this id.
    pub fn find_similar(
        &self,
        id: &str,
        options: &SearchOptions,
    ) -> MemoryResult<Vec<SearchResult>> {
        let entry = self
            .entries
            .get(id)
            .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;
        Ok(self.search(&entry.content, options))
    }

    /// Memories containing any of `keywords`, ranked by keyword Jaccard overlap.
    #[must_use]
    pub fn get_by_keywords<S: AsRef<str>>(&self, keywords: &[S]) -> Vec<SearchResult> {
        let mut wanted: Vec<String> = Vec::new();
        for normalized in keywords
            .iter()
            .filter_map(|keyword| self.keyword_extractor.normalize(keyword.as_ref()))
        {
            if !wanted.contains(&normalized) {
                wanted.push(normalized);
            }
        }

        let ids: BTreeSet<&str> = wanted
            .iter()
            .filter_map(|keyword| self.keyword_postings.get(keyword))
            .flatten()
            .map(String::as_str)
            .collect();
        let mut scored: Vec<(f64, &MemoryIndexEntry)> = ids
            .into_iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| (jaccard(&wanted, &entry.keywords), entry))
            .collect();
        sort_ranked(&mut scored);

        scored
            .into_iter()
            .map(|(score, entry)| SearchResult::from_entry(entry, score, None))
            .collect()
    }

    /// Memories mentioning any of `entities`, ranked by the fraction of
    /// requested entities they mention.
    #[must_use]
    pub fn get_by_entities<S: AsRef<str>>(&self, entities: &[S]) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let wanted: Vec<String> = entities
            .iter()
            .map(|entity| entity.as_ref().trim().to_string())
            .filter(|entity| !entity.is_empty() && seen.insert(entity.clone()))
            .collect();

        let ids: BTreeSet<&str> = wanted
            .iter()
            .filter_map(|entity| self.entity_postings.get(entity))
            .flatten()
            .map(String::as_str)
            .collect();
        let mut scored: Vec<(f64, &MemoryIndexEntry)> = ids
            .into_iter()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| (precision(&wanted, &entry.entities), entry))
            .collect();
        sort_ranked(&mut scored);

        scored
            .into_iter()
            .map(|(score, entry)| SearchResult::from_entry(entry, score, None))
            .collect()
    }

    fn candidates(&self, analysis: &TextAnalysis) -> BTreeSet<&str> {
        let keyword_hits = analysis
            .keywords
            .iter()
            .filter_map(|keyword| self.keyword_postings.get(keyword));
        let entity_hits = analysis
            .entities
            .iter()
            .filter_map(|entity| self.entity_postings.get(entity));

        let candidates: BTreeSet<&str> = keyword_hits
            .chain(entity_hits)
            .flatten()
            .map(String::as_str)
            .collect();

        if candidates.is_empty() {
            self.entries.keys().map(String::as_str).collect()
        } else {
            candidates
        }
    }
}

fn sort_ranked(scored: &mut [(f64, &MemoryIndexEntry)]) {
    scored.sort_by(|(score_a, a), (score_b, b)| {
        score_b.total_cmp(score_a).then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    const M1: &str = "Use `npm test` to run tests before deploying to production";
    const M2: &str = "Deployment pipeline failed because of missing environment variable";

    fn deploy_index(now: DateTime<Utc>) -> SemanticIndex {
        let mut index = SemanticIndex::new().unwrap();
        index.index_memory_at("m1", M1, MemoryMetadata::new(), MemorySource::Note, now);
        index.index_memory_at("m2", M2, MemoryMetadata::new(), MemorySource::TaskResult, now);
        index
    }

    fn assert_sorted(results: &[SearchResult]) {
        for pair in results.windows(2) {
            assert!(pair[0].relevance_score >= pair[1].relevance_score);
        }
    }

    #[test]
    fn test_deploy_tests_returns_both_with_context() {
        let now = Utc::now();
        let index = deploy_index(now);
        let results = index.search_at("deploy tests", &SearchOptions::default(), now);

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"m1"), "{ids:?}");
        assert!(ids.contains(&"m2"), "{ids:?}");
        for result in &results {
            assert!(result.relevance_score > 0.0);
            assert!(result.relevance_score <= 1.0);
            assert!(result.context.as_deref().is_some_and(|c| !c.is_empty()));
        }
        assert_sorted(&results);

        // m1 shares "deploy" and "test", m2 only "deploy". m2 still ranks first:
        // "deploy" leads both m2 and the query, so the vector term outweighs
        // the keyword term.
        let query = index.analyze("deploy tests");
        let breakdown =
            |id: &str| score_entry(index.get(id).unwrap(), &query, "deploy tests", now);
        let (m1, m2) = (breakdown("m1"), breakdown("m2"));
        assert!((m1.keyword_overlap - 2.0 / 6.0).abs() < 1e-9);
        assert!((m2.keyword_overlap - 1.0 / 8.0).abs() < 1e-9);
        assert!(m2.similarity > m1.similarity);
        assert_eq!(ids, vec!["m2", "m1"]);
        assert!((results[1].relevance_score - m1.score).abs() < 1e-9);
    }

    #[test]
    fn test_context_can_be_disabled() {
        let now = Utc::now();
        let index = deploy_index(now);
        let options = SearchOptions::default().with_context(false);
        let results = index.search_at("deploy tests", &options, now);
        assert!(!results.is_empty());
        assert!(results.iter().all(|r| r.context.is_none()));
    }

    #[test]
    fn test_newer_entry_never_scores_lower() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        let content = "Rotate the signing keys every quarter";
        let note = MemorySource::Note;
        let (hour_ago, weeks_ago) = (now - Duration::hours(1), now - Duration::days(40));
        index.index_memory_at("new", content, MemoryMetadata::new(), note, hour_ago);
        index.index_memory_at("old", content, MemoryMetadata::new(), note, weeks_ago);

        let options = SearchOptions::default().with_min_relevance_score(0.0);
        let results = index.search_at("signing keys", &options, now);
        let score = |id: &str| {
            results
                .iter()
                .find(|r| r.id == id)
                .map(|r| r.relevance_score)
                .unwrap()
        };
        assert!(score("new") >= score("old"));
        assert_eq!(results[0].id, "new");
    }

    #[test]
    fn test_high_priority_boost() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        let content = "Database backups run nightly";
        index.index_memory_at("plain", content, MemoryMetadata::new(), MemorySource::Note, now);
        index.index_memory_at(
            "urgent",
            content,
            MemoryMetadata::new().with_priority("high"),
            MemorySource::Note,
            now,
        );

        let results = index.search_at("database backups", &SearchOptions::default(), now);
        assert_eq!(results[0].id, "urgent");
        assert!(results[0].relevance_score >= results[1].relevance_score);
    }

    #[test]
    fn test_recent_scope_drops_old_entries() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        let content = "cache invalidation notes";
        let note = MemorySource::Note;
        let (two_days, eight_days) = (now - Duration::days(2), now - Duration::days(8));
        index.index_memory_at("fresh", content, MemoryMetadata::new(), note, two_days);
        index.index_memory_at("stale", content, MemoryMetadata::new(), note, eight_days);

        let options = SearchOptions::default().with_scope(SearchScope::Recent);
        let ids: Vec<String> = index
            .search_at("cache invalidation", &options, now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["fresh".to_string()]);
    }

    #[test]
    fn test_important_scope() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        let tagged = [
            ("flagged", MemoryMetadata::new().with("important", true)),
            ("high", MemoryMetadata::new().with_priority("high")),
            ("plain", MemoryMetadata::new()),
        ];
        for (id, metadata) in tagged {
            index.index_memory_at(id, "release checklist", metadata, MemorySource::Note, now);
        }

        let options = SearchOptions::default().with_scope(SearchScope::Important);
        let mut ids: Vec<String> = index
            .search_at("release checklist", &options, now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["flagged".to_string(), "high".to_string()]);
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let now = Utc::now();
        let start = now - Duration::days(3);
        let mut index = SemanticIndex::new().unwrap();
        let content = "incident review notes";
        let note = MemorySource::Note;
        index.index_memory_at("edge", content, MemoryMetadata::new(), note, start);
        let just_before = start - Duration::seconds(1);
        index.index_memory_at("before", content, MemoryMetadata::new(), note, just_before);

        let options = SearchOptions::default().with_time_range(TimeRange::new(start, now));
        let ids: Vec<String> = index
            .search_at("incident review", &options, now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["edge".to_string()]);
    }

    #[test]
    fn test_no_shared_terms_scores_whole_index() {
        let now = Utc::now();
        let index = deploy_index(now);
        let options = SearchOptions::default().with_min_relevance_score(0.0);
        let results = index.search_at("zzz qqq", &options, now);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_max_results_truncates() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        for i in 0..5 {
            index.index_memory_at(
                format!("m{i}"),
                "shared keyword content",
                MemoryMetadata::new(),
                MemorySource::Manual,
                now,
            );
        }
        let options = SearchOptions::default().with_max_results(3);
        let results = index.search_at("shared keyword", &options, now);
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_find_similar_includes_source() {
        let now = Utc::now();
        let index = deploy_index(now);
        let results = index.find_similar("m1", &SearchOptions::default()).unwrap();
        assert_eq!(results[0].id, "m1");
        let missing = index.find_similar("ghost", &SearchOptions::default());
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_get_by_keywords_normalizes_input() {
        let index = deploy_index(Utc::now());
        let results = index.get_by_keywords(&["Deployment", "pipelines"]);
        assert_eq!(results[0].id, "m2");
        assert!(results.iter().any(|r| r.id == "m1"));
        assert!(results[0].relevance_score > results[1].relevance_score);
        assert!(index.get_by_keywords(&["the"]).is_empty());
    }

    #[test]
    fn test_get_by_entities_scores_coverage() {
        let now = Utc::now();
        let mut index = SemanticIndex::new().unwrap();
        let note = MemorySource::Note;
        index.index_memory_at("both", "AWS and GCP accounts", MemoryMetadata::new(), note, now);
        index.index_memory_at("one", "AWS billing alarms", MemoryMetadata::new(), note, now);

        let results = index.get_by_entities(&["AWS", "GCP"]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "both");
        assert!((results[0].relevance_score - 1.0).abs() < f64::EPSILON);
        assert!((results[1].relevance_score - 0.5).abs() < f64::EPSILON);
    }
}
