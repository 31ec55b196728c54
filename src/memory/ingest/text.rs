//! Small text helpers shared by retrieval and linting.

/// Split text into trimmed, non-empty sentences on runs of `.`, `!` and `?`.
#[must_use]
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Split text into whitespace-separated words.
#[must_use]
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}
