//! Context sentence selection for search results.

use std::collections::HashSet;

use crate::memory::ingest::keywords::KeywordExtractor;
use crate::memory::ingest::text::split_sentences;

/// Pick the sentence of `content` covering the largest fraction of
/// `query_keywords`. The first sentence wins ties; `None` when the content
/// has no sentence.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn best_sentence(
    extractor: &KeywordExtractor,
    content: &str,
    query_keywords: &[String],
) -> Option<String> {
    let wanted: HashSet<&str> = query_keywords.iter().map(String::as_str).collect();
    let mut best: Option<(&str, f64)> = None;

    for sentence in split_sentences(content) {
        let fraction = if wanted.is_empty() {
            0.0
        } else {
            let found = extractor
                .extract(sentence)
                .iter()
                .filter(|keyword| wanted.contains(keyword.as_str()))
                .count();
            found as f64 / wanted.len() as f64
        };
        if best.is_none_or(|(_, current)| fraction > current) {
            best = Some((sentence, fraction));
        }
    }

    best.map(|(sentence, _)| sentence.to_string())
}
