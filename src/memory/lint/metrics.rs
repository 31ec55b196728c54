//! Quality sub-scores of a memory text.

use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;
use url::Url;

use crate::memory::ingest::text::{split_sentences, words};

const TECHNICAL_TERMS: &[&str] = &[
    "api", "endpoint", "database", "schema", "migration", "query", "cache", "server", "client",
    "config", "configuration", "deploy", "deployment", "build", "test", "tests", "pipeline",
    "docker", "kubernetes", "git", "branch", "commit", "npm", "cargo", "function", "module",
    "token", "auth", "environment", "variable", "log", "logs", "error", "timeout", "port",
];

const ACTION_VERBS: &[&str] = &[
    "use", "run", "add", "remove", "set", "avoid", "prefer", "check", "install", "update",
    "configure", "create", "delete", "restart", "call", "write", "read", "verify", "ensure",
];

/// Four sub-scores in `[0, 1]` and their mean.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct QualityMetrics {
    /// Concrete detail versus vague wording.
    pub specificity: f64,
    /// Sentence and word length.
    pub clarity: f64,
    /// Examples, reasons, conditions and steps.
    pub completeness: f64,
    /// Technical vocabulary and actionable verbs.
    pub relevance: f64,
    /// Mean of the four sub-scores.
    pub overall: f64,
}

/// Computes [`QualityMetrics`] with precompiled patterns.
pub struct QualityAnalyzer {
    digits: Regex,
    inline_code: Regex,
    url_candidate: Regex,
    quoted: Regex,
    file_extension: Regex,
    vague: Regex,
    example: Regex,
    causal: Regex,
    conditional: Regex,
    procedural: Regex,
    word: Regex,
}

impl QualityAnalyzer {
    /// Compile the analyzer patterns.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            digits: Regex::new(r"\d")?,
            inline_code: Regex::new(r"`[^`\n]+`")?,
            url_candidate: Regex::new(r#"https?://[^\s<>"'`)]+"#)?,
            quoted: Regex::new(r#""[^"\n]+"|'[^'\n]{2,}'"#)?,
            file_extension: Regex::new(
                r"(?i)\b[\w-]+\.(rs|ts|tsx|js|jsx|py|go|java|md|json|ya?ml|toml|txt|sh|sql|css|html|lock)\b",
            )?,
            vague: Regex::new(r"(?i)\b(thing|things|stuff|something|etc|various)\b")?,
            example: Regex::new(
                r"(?i)(\bfor example\b|\bfor instance\b|\be\.g\.|\bsuch as\b|\bexample\b|```)",
            )?,
            causal: Regex::new(r"(?i)\b(because|since|due to|so that|therefore|why)\b")?,
            conditional: Regex::new(r"(?i)\b(if|when|unless|whenever|otherwise)\b")?,
            procedural: Regex::new(r"(?i)\b(first|then|next|finally|step|afterwards|how)\b")?,
            word: Regex::new(r"[A-Za-z][A-Za-z'-]*")?,
        })
    }

    /// Score `content`.
    #[must_use]
    pub fn analyze(&self, content: &str) -> QualityMetrics {
        let specificity = self.specificity(content);
        let clarity = clarity(content);
        let completeness = self.completeness(content);
        let relevance = self.relevance(content);
        QualityMetrics {
            specificity,
            clarity,
            completeness,
            relevance,
            overall: (specificity + clarity + completeness + relevance) / 4.0,
        }
    }

    /// Whether `content` carries an example marker.
    #[must_use]
    pub fn has_example(&self, content: &str) -> bool {
        self.example.is_match(content)
    }

    /// Whether `content` mentions commands, APIs or configuration.
    #[must_use]
    pub fn mentions_command_or_config(&self, content: &str) -> bool {
        self.word.find_iter(content).any(|word| {
            matches!(
                word.as_str().to_lowercase().as_str(),
                "command" | "commands" | "api" | "endpoint" | "config" | "configuration" | "setting"
                    | "settings" | "flag" | "option"
            )
        }) || self.inline_code.is_match(content)
    }

    #[allow(clippy::cast_precision_loss)]
    fn specificity(&self, content: &str) -> f64 {
        let mut score: f64 = 0.5;
        let signals = [
            self.digits.is_match(content),
            self.inline_code.is_match(content),
            self.has_url(content),
            self.quoted.is_match(content),
            self.file_extension.is_match(content),
        ];
        score += 0.1 * signals.iter().filter(|present| **present).count() as f64;
        score -= 0.05 * self.vague.find_iter(content).count() as f64;
        score.clamp(0.0, 1.0)
    }

    fn has_url(&self, content: &str) -> bool {
        self.url_candidate.find_iter(content).any(|candidate| {
            let trimmed = candidate.as_str().trim_end_matches(['.', ',', ';', ':']);
            Url::parse(trimmed).is_ok_and(|url| url.host_str().is_some())
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn completeness(&self, content: &str) -> f64 {
        let mut score: f64 = 0.5;
        if self.example.is_match(content) {
            score += 0.2;
        }
        if self.causal.is_match(content) {
            score += 0.1;
        }
        if self.conditional.is_match(content) {
            score += 0.1;
        }
        if self.procedural.is_match(content) {
            score += 0.1;
        }
        let length = content.chars().count() as f64;
        score += (length / 500.0).min(1.0) * 0.1;
        score.clamp(0.0, 1.0)
    }

    #[allow(clippy::cast_precision_loss)]
    fn relevance(&self, content: &str) -> f64 {
        let lowered: HashSet<String> = self
            .word
            .find_iter(content)
            .map(|word| word.as_str().to_lowercase())
            .collect();
        let technical = TECHNICAL_TERMS
            .iter()
            .filter(|term| lowered.contains(**term))
            .count();
        let actions = ACTION_VERBS
            .iter()
            .filter(|verb| lowered.contains(**verb))
            .count();
        0.03_f64
            .mul_add(actions as f64, 0.05_f64.mul_add(technical as f64, 0.6))
            .clamp(0.0, 1.0)
    }
}

impl Default for QualityAnalyzer {
    /// Creates a default analyzer.
    ///
    /// # Panics
    /// Panics if a built-in pattern is invalid (should never happen).
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self::new().expect("Default quality patterns should be valid")
    }
}

#[allow(clippy::cast_precision_loss)]
fn clarity(content: &str) -> f64 {
    let mut score: f64 = 0.7;

    let sentences = split_sentences(content);
    if !sentences.is_empty() {
        let total: usize = sentences.iter().map(|s| s.chars().count()).sum();
        let mean = total as f64 / sentences.len() as f64;
        if mean < 50.0 {
            score += 0.2;
        } else if mean > 100.0 {
            score -= 0.2;
        }
    }

    let words = words(content);
    if !words.is_empty() {
        let long = words.iter().filter(|w| w.chars().count() >= 10).count();
        if long as f64 / words.len() as f64 > 0.1 {
            score -= 0.1;
        }
    }

    score.clamp(0.0, 1.0)
}
