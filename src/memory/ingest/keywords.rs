//! Keyword extraction and normalization.

use std::collections::HashSet;

use regex::Regex;

/// Words ignored during keyword extraction (compared before stemming).
pub const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "her", "was", "one", "our",
    "out", "has", "have", "had", "his", "him", "she", "its", "this", "that", "with", "from",
    "they", "them", "their", "there", "these", "those", "will", "would", "could", "should",
    "what", "which", "who", "whom", "about", "into", "than", "then", "some", "other", "been",
    "were", "being", "each", "also", "just", "only", "over", "such", "very", "more", "most",
    "after", "before", "where", "while", "your", "yours", "does", "did", "any", "may", "both",
    "how", "why", "when", "here", "off", "own", "same", "too", "nor", "now", "again", "once",
];

/// Minimum keyword length kept (shorter tokens are dropped).
const MIN_KEYWORD_CHARS: usize = 3;

/// Extracts normalized keywords from free text.
pub struct KeywordExtractor {
    non_word: Regex,
    stop_words: HashSet<&'static str>,
}

impl KeywordExtractor {
    /// Create a keyword extractor.
    ///
    /// # Errors
    /// Returns an error if the tokenizer pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            non_word: Regex::new(r"[^\w\s]")?,
            stop_words: STOP_WORDS.iter().copied().collect(),
        })
    }

    /// Extract keywords in first-occurrence order without duplicates.
    ///
    /// Lowercases, replaces non-word characters with spaces, drops short
    /// tokens and stop words, then stems each survivor.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let cleaned = self.non_word.replace_all(&lowered, " ");
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        for token in cleaned.split_whitespace() {
            if token.chars().count() < MIN_KEYWORD_CHARS || self.stop_words.contains(token) {
                continue;
            }
            let stemmed = stem(token);
            if seen.insert(stemmed.clone()) {
                keywords.push(stemmed);
            }
        }

        keywords
    }

    /// Normalize a single caller-supplied keyword to its posting key.
    ///
    /// Returns `None` when the keyword would never be indexed.
    #[must_use]
    pub fn normalize(&self, keyword: &str) -> Option<String> {
        self.extract(keyword).into_iter().next()
    }
}

impl Default for KeywordExtractor {
    /// Creates a default keyword extractor.
    ///
    /// # Panics
    /// Panics if the tokenizer pattern is invalid (should never happen).
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new().expect("Default keyword tokenizer pattern should be valid")
    }
}

/// Conservative suffix stripper so inflected forms share one posting.
///
/// Strips one plural ending, then at most one of `-ment`, `-ing`, `-ed`.
/// Non-ASCII words are returned unchanged.
#[must_use]
pub fn stem(word: &str) -> String {
    if !word.bytes().all(|b| b.is_ascii_lowercase()) {
        return word.to_string();
    }

    let mut base = strip_plural(word);

    if let Some(stem) = base.strip_suffix("ment") {
        if stem.len() >= 4 {
            base = stem.to_string();
        }
    } else if let Some(stem) = base.strip_suffix("ing") {
        if stem.len() >= 4 {
            base = undouble(stem);
        }
    } else if let Some(stem) = base.strip_suffix("ed") {
        if stem.len() >= 3 && !stem.ends_with('e') {
            base = undouble(stem);
        }
    }

    base
}

fn strip_plural(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("sses") {
        return format!("{stem}ss");
    }
    if let Some(stem) = word.strip_suffix("ies") {
        if stem.len() >= 2 {
            return format!("{stem}y");
        }
        return word.to_string();
    }
    if let Some(stem) = word.strip_suffix('s') {
        let keeps_s = stem.ends_with('s') || stem.ends_with('u') || stem.ends_with('i');
        if !keeps_s && stem.len() >= MIN_KEYWORD_CHARS {
            return stem.to_string();
        }
    }
    word.to_string()
}

/// Collapse a trailing doubled stop consonant (`runn` -> `run`).
fn undouble(stem: &str) -> String {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 4 && bytes[n - 1] == bytes[n - 2] && b"bdgmnpt".contains(&bytes[n - 1]) {
        return stem[..n - 1].to_string();
    }
    stem.to_string()
}
