//! Inverted index from terms to memory ids.

use std::collections::{BTreeMap, BTreeSet};

/// Term → set of memory ids whose current content contains the term.
///
/// Sets that become empty are pruned, so every stored term has at least one id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostingMap {
    postings: BTreeMap<String, BTreeSet<String>>,
}

impl PostingMap {
    /// Create an empty posting map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` contains every term in `terms`.
    pub fn insert_all(&mut self, terms: &[String], id: &str) {
        for term in terms {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(id.to_string());
        }
    }

    /// Drop `id` from every term in `terms`, pruning emptied sets.
    pub fn remove_all(&mut self, terms: &[String], id: &str) {
        for term in terms {
            let emptied = self.postings.get_mut(term).is_some_and(|ids| {
                ids.remove(id);
                ids.is_empty()
            });
            if emptied {
                self.postings.remove(term);
            }
        }
    }

    /// Ids posted under `term`.
    #[must_use]
    pub fn get(&self, term: &str) -> Option<&BTreeSet<String>> {
        self.postings.get(term)
    }

    /// Whether `id` is posted under `term`.
    #[must_use]
    pub fn contains(&self, term: &str, id: &str) -> bool {
        self.postings.get(term).is_some_and(|ids| ids.contains(id))
    }

    /// Terms currently referencing `id`.
    #[must_use]
    pub fn terms_for(&self, id: &str) -> Vec<&str> {
        self.postings
            .iter()
            .filter(|(_, ids)| ids.contains(id))
            .map(|(term, _)| term.as_str())
            .collect()
    }

    /// Number of distinct terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Whether no terms are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Remove every posting.
    pub fn clear(&mut self) {
        self.postings.clear();
    }

    /// Plain map form used by snapshots.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, Vec<String>> {
        self.postings
            .iter()
            .map(|(term, ids)| (term.clone(), ids.iter().cloned().collect()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut postings = PostingMap::new();
        postings.insert_all(&terms(&["cache", "lru"]), "m1");
        postings.insert_all(&terms(&["cache"]), "m2");

        assert_eq!(postings.len(), 2);
        assert!(postings.contains("cache", "m1"));
        assert!(postings.contains("cache", "m2"));
        assert_eq!(postings.terms_for("m1"), vec!["cache", "lru"]);
    }

    #[test]
    fn test_remove_prunes_empty_sets() {
        let mut postings = PostingMap::new();
        postings.insert_all(&terms(&["cache", "lru"]), "m1");
        postings.insert_all(&terms(&["cache"]), "m2");

        postings.remove_all(&terms(&["cache", "lru"]), "m1");

        assert!(postings.get("lru").is_none());
        assert!(!postings.contains("cache", "m1"));
        assert!(postings.contains("cache", "m2"));
        assert!(postings.terms_for("m1").is_empty());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut postings = PostingMap::new();
        postings.remove_all(&terms(&["ghost"]), "m1");
        assert!(postings.is_empty());
    }
}
