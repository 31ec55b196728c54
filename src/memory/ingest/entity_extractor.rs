//! Named entity extraction for memory enrichment.
//!
//! Extracts capitalized name bigrams, acronyms, domains and email addresses.

use regex::Regex;
use std::collections::HashSet;

/// Types of entities that can be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// Two consecutive capitalized words ("Ada Lovelace").
    ProperName,
    /// An all-caps acronym ("API", "CI").
    Acronym,
    /// A domain-like token ("docs.rs").
    Domain,
    /// An email address.
    Email,
}

/// An extracted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntity {
    /// The type of entity.
    pub entity_type: EntityType,
    /// The raw extracted value.
    pub value: String,
    /// Byte offset of the match in the source text.
    pub start: usize,
}

/// Pattern-based entity extractor.
#[allow(clippy::struct_field_names)]
pub struct EntityExtractor {
    email_pattern: Regex,
    domain_pattern: Regex,
    proper_name_pattern: Regex,
    acronym_pattern: Regex,
}

impl EntityExtractor {
    /// Create a new entity extractor.
    ///
    /// # Errors
    /// Returns an error if any regex pattern is invalid.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            email_pattern: Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b")?,
            domain_pattern: Regex::new(
                r"\b(?:[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}\b",
            )?,
            proper_name_pattern: Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b")?,
            acronym_pattern: Regex::new(r"\b[A-Z]{2,}\b")?,
        })
    }

    /// Extract all entities from the given text.
    ///
    /// Emails are matched first; domains that only occur inside an email are
    /// not reported separately.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut email_spans = Vec::new();

        for found in self.email_pattern.find_iter(text) {
            email_spans.push(found.start()..found.end());
            push_unique(
                &mut entities,
                &mut seen,
                EntityType::Email,
                found.as_str(),
                found.start(),
            );
        }

        for found in self.domain_pattern.find_iter(text) {
            let inside_email = email_spans
                .iter()
                .any(|span| span.contains(&found.start()));
            if !inside_email && !looks_like_file_name(found.as_str()) {
                push_unique(
                    &mut entities,
                    &mut seen,
                    EntityType::Domain,
                    found.as_str(),
                    found.start(),
                );
            }
        }

        for found in self.proper_name_pattern.find_iter(text) {
            let value = found
                .as_str()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            push_unique(&mut entities, &mut seen, EntityType::ProperName, &value, found.start());
        }

        for found in self.acronym_pattern.find_iter(text) {
            push_unique(
                &mut entities,
                &mut seen,
                EntityType::Acronym,
                found.as_str(),
                found.start(),
            );
        }

        entities.sort_by_key(|entity| entity.start);
        entities
    }

    /// Extract deduplicated entity values in order of appearance.
    #[must_use]
    pub fn extract_values(&self, text: &str) -> Vec<String> {
        self.extract(text).into_iter().map(|e| e.value).collect()
    }
}

impl Default for EntityExtractor {
    /// Creates a default entity extractor.
    ///
    /// # Panics
    /// Panics if the default regex patterns are invalid (should never happen).
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new().expect("Default entity extractor patterns should be valid")
    }
}

fn push_unique(
    entities: &mut Vec<ExtractedEntity>,
    seen: &mut HashSet<String>,
    entity_type: EntityType,
    value: &str,
    start: usize,
) {
    if seen.insert(value.to_string()) {
        entities.push(ExtractedEntity {
            entity_type,
            value: value.to_string(),
            start,
        });
    }
}

/// File names share the domain shape (`README.md`); skip common document and
/// source extensions.
fn looks_like_file_name(candidate: &str) -> bool {
    const FILE_EXTENSIONS: &[&str] = &[
        "md", "txt", "yaml", "yml", "json", "toml", "rs", "py", "js", "ts", "tsx", "jsx", "go",
        "java", "html", "css", "sh", "lock", "log", "cfg", "ini", "csv",
    ];
    candidate
        .rsplit('.')
        .next()
        .is_some_and(|ext| FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
