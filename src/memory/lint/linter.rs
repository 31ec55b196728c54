//! Memory quality linter: rule registry, dispatch and scoring.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::lint::metrics::{QualityAnalyzer, QualityMetrics};
use crate::memory::lint::rules::{
    LintIssue, LintRule, LintScope, LintSeverity, MAX_MEMORY_CHARS, MIN_MEMORY_CHARS, RuleCheck,
    builtin_rules,
};

/// Score below which a sub-score produces a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.6;

/// Outcome of linting one text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LintResult {
    /// Linted text.
    pub content: String,
    /// Issues in rule order.
    pub issues: Vec<LintIssue>,
    /// Quality score in `[0, 100]`.
    pub score: f64,
    /// Issue counts, e.g. `1 errors, 0 warnings, 2 info`.
    pub summary: String,
    /// Sub-scores the score was derived from.
    pub metrics: QualityMetrics,
}

impl LintResult {
    /// Number of issues with `severity`.
    #[must_use]
    pub fn count(&self, severity: LintSeverity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    /// Whether any error-level issue was found.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.count(LintSeverity::Error) > 0
    }
}

/// Rule registry plus the dispatch table of rule checks.
pub struct MemoryLinter {
    rules: Vec<LintRule>,
    checks: HashMap<String, RuleCheck>,
    analyzer: QualityAnalyzer,
}

impl MemoryLinter {
    /// Create a linter with the built-in rules.
    ///
    /// # Errors
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> MemoryResult<Self> {
        let mut linter = Self {
            rules: Vec::new(),
            checks: HashMap::new(),
            analyzer: QualityAnalyzer::new()?,
        };
        for (rule, check) in builtin_rules()? {
            linter.add_rule(rule, check);
        }
        Ok(linter)
    }

    /// Lint a single memory with the enabled memory rules.
    #[must_use]
    pub fn lint_memory(&self, content: &str) -> LintResult {
        self.run(content, &[LintScope::Memory])
    }

    /// Lint a memory file: memory rules plus the file-only rules.
    #[must_use]
    pub fn lint_claude_file(&self, content: &str) -> LintResult {
        self.run(content, &[LintScope::Memory, LintScope::ClaudeFile])
    }

    /// Quality sub-scores of `content`.
    #[must_use]
    pub fn metrics(&self, content: &str) -> QualityMetrics {
        self.analyzer.analyze(content)
    }

    /// Improvement hints for `content`.
    #[must_use]
    pub fn suggestions(&self, content: &str) -> Vec<String> {
        let metrics = self.analyzer.analyze(content);
        let mut suggestions = Vec::new();

        if metrics.specificity < SUGGESTION_THRESHOLD {
            suggestions.push(
                "Be more specific: name files, commands, versions or values".to_string(),
            );
        }
        if metrics.clarity < SUGGESTION_THRESHOLD {
            suggestions.push("Use shorter sentences and simpler words".to_string());
        }
        if metrics.completeness < SUGGESTION_THRESHOLD {
            suggestions.push("Explain why or when this applies".to_string());
        }
        if metrics.relevance < SUGGESTION_THRESHOLD {
            suggestions.push("Focus on actionable, technical information".to_string());
        }

        let length = content.trim().chars().count();
        if length < MIN_MEMORY_CHARS {
            suggestions.push("Add more detail so the memory is useful on its own".to_string());
        } else if content.chars().count() > MAX_MEMORY_CHARS {
            suggestions.push("Split this into several smaller memories".to_string());
        }

        if self.analyzer.mentions_command_or_config(content) && !self.analyzer.has_example(content)
        {
            suggestions.push("Add a concrete example of the command or setting".to_string());
        }

        suggestions
    }

    /// Register a rule, replacing any rule with the same id in place.
    pub fn add_rule(&mut self, rule: LintRule, check: RuleCheck) {
        self.checks.insert(rule.id.clone(), check);
        if let Some(existing) = self.rules.iter_mut().find(|r| r.id == rule.id) {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    /// Enable or disable a rule.
    ///
    /// # Errors
    /// Returns an error if no rule has this id.
    pub fn set_rule_enabled(&mut self, id: &str, enabled: bool) -> MemoryResult<()> {
        let rule = self
            .rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or_else(|| MemoryError::lint_rule(id, "no such rule"))?;
        rule.enabled = enabled;
        Ok(())
    }

    /// Look up a rule.
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&LintRule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// All registered rules in run order.
    #[must_use]
    pub fn rules(&self) -> &[LintRule] {
        &self.rules
    }

    fn run(&self, content: &str, scopes: &[LintScope]) -> LintResult {
        let mut issues = Vec::new();

        for rule in self
            .rules
            .iter()
            .filter(|rule| rule.enabled && scopes.contains(&rule.scope))
        {
            let Some(check) = self.checks.get(&rule.id) else {
                warn!(rule = %rule.id, "Lint rule has no registered check");
                continue;
            };
            match check(content, rule) {
                Ok(found) => issues.extend(found),
                Err(err) => warn!(rule = %rule.id, error = %err, "Lint rule failed; skipping"),
            }
        }

        let metrics = self.analyzer.analyze(content);
        let score = score(&issues, &metrics);
        let summary = summarize(&issues);
        debug!(score, issues = issues.len(), "Linted content");

        LintResult {
            content: content.to_string(),
            issues,
            score,
            summary,
            metrics,
        }
    }
}

fn score(issues: &[LintIssue], metrics: &QualityMetrics) -> f64 {
    let penalty: f64 = issues
        .iter()
        .map(|issue| match issue.severity {
            LintSeverity::Error => 10.0,
            LintSeverity::Warning => 5.0,
            LintSeverity::Info => 1.0,
        })
        .sum();
    20.0_f64
        .mul_add(metrics.overall, 100.0 - penalty)
        .clamp(0.0, 100.0)
}

fn summarize(issues: &[LintIssue]) -> String {
    let count = |severity| issues.iter().filter(|i| i.severity == severity).count();
    format!(
        "{} errors, {} warnings, {} info",
        count(LintSeverity::Error),
        count(LintSeverity::Warning),
        count(LintSeverity::Info)
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::lint::rules::LintCategory;

    fn custom_rule(id: &str) -> LintRule {
        LintRule::new(
            id,
            "Custom",
            "Test rule",
            LintSeverity::Error,
            LintCategory::Formatting,
            LintScope::Memory,
        )
    }

    #[test]
    fn test_score_bounds_include_empty_string() {
        let linter = MemoryLinter::new().unwrap();
        let spam = "thing stuff etc ".repeat(100);
        let good = "Use `npm test` before deploying because CI is slow";
        for text in ["", " ", "x", spam.as_str(), good] {
            let result = linter.lint_memory(text);
            assert!((0.0..=100.0).contains(&result.score), "{text:?} -> {}", result.score);
        }
        let empty = linter.lint_memory("");
        assert!(empty.has_errors());
        assert_eq!(empty.summary, "1 errors, 0 warnings, 0 info");
    }

    #[test]
    fn test_good_memory_scores_high() {
        let linter = MemoryLinter::new().unwrap();
        let result = linter.lint_memory(
            "Run `cargo test --all` before pushing because CI rejects failing builds.",
        );
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert!(result.score > 100.0 - f64::EPSILON);
    }

    #[test]
    fn test_claude_file_runs_extra_rules() {
        let linter = MemoryLinter::new().unwrap();
        let content = "Use the shared rules from @rules/setup.sh when you start a task.";
        assert!(
            !linter
                .lint_memory(content)
                .issues
                .iter()
                .any(|i| i.rule_id == "import-syntax" || i.rule_id == "header-structure")
        );
        let file = linter.lint_claude_file(content);
        assert!(file.issues.iter().any(|i| i.rule_id == "import-syntax"));
        assert!(file.issues.iter().any(|i| i.rule_id == "header-structure"));
    }

    #[test]
    fn test_disable_rule() {
        let mut linter = MemoryLinter::new().unwrap();
        linter.set_rule_enabled("length", false).unwrap();
        assert!(!linter.rule("length").unwrap().enabled);
        assert!(linter.lint_memory("").issues.iter().all(|i| i.rule_id != "length"));
        assert!(linter.set_rule_enabled("missing", true).is_err());
    }

    #[test]
    fn test_custom_rule_runs_last() {
        let mut linter = MemoryLinter::new().unwrap();
        let check: RuleCheck = Arc::new(
            |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
                Ok(if content.contains("TODO") {
                    vec![rule.issue("Unfinished note")]
                } else {
                    Vec::new()
                })
            },
        );
        linter.add_rule(custom_rule("no-todo"), check);

        assert_eq!(linter.rules().last().unwrap().id, "no-todo");
        let result = linter.lint_memory("TODO write the deployment checklist for staging");
        assert_eq!(result.issues.last().unwrap().rule_id, "no-todo");
    }

    #[test]
    fn test_failing_rule_is_skipped() {
        let mut linter = MemoryLinter::new().unwrap();
        let check: RuleCheck = Arc::new(|_: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
            Err(MemoryError::lint_rule(rule.id.clone(), "broken"))
        });
        linter.add_rule(custom_rule("broken"), check);

        let result =
            linter.lint_memory("Restart the worker when the queue backs up past 1000 jobs.");
        assert!(result.issues.iter().all(|i| i.rule_id != "broken"));
        assert!((0.0..=100.0).contains(&result.score));
    }

    #[test]
    fn test_add_rule_replaces_same_id() {
        let mut linter = MemoryLinter::new().unwrap();
        let before = linter.rules().len();
        let check: RuleCheck = Arc::new(|_: &str, _: &LintRule| -> MemoryResult<Vec<LintIssue>> {
            Ok(Vec::new())
        });
        linter.add_rule(custom_rule("length"), check);

        assert_eq!(linter.rules().len(), before);
        assert_eq!(linter.rules()[1].id, "length");
        assert!(linter.lint_memory("").issues.is_empty());
    }

    #[test]
    fn test_suggestions() {
        let linter = MemoryLinter::new().unwrap();
        let short = linter.suggestions("fix stuff");
        assert!(short.iter().any(|s| s.contains("more detail")));

        let long = linter.suggestions(&"Deploy the api service to staging. ".repeat(20));
        assert!(long.iter().any(|s| s.contains("Split")));
        assert!(long.iter().any(|s| s.contains("example")));
    }
}
