//! Lint rule descriptors and the built-in rule checks.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::memory::core::errors::MemoryResult;
use crate::memory::imports::paths::has_allowed_extension;
use crate::memory::imports::resolver::DEFAULT_ALLOWED_EXTENSIONS;
use crate::memory::ingest::text::split_sentences;

/// Issue severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    /// Must be fixed.
    Error,
    /// Should be fixed.
    Warning,
    /// Advisory.
    Info,
}

/// What aspect of a memory a rule inspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintCategory {
    /// Concrete, precise wording.
    Specificity,
    /// Overall size.
    Length,
    /// Readability.
    Clarity,
    /// Repeated wording.
    Redundancy,
    /// Markdown and code formatting.
    Formatting,
    /// Surrounding context such as reasons and conditions.
    Completeness,
    /// Import directive syntax.
    Syntax,
    /// Document structure.
    Structure,
}

/// Which lint entry point runs a rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LintScope {
    /// Every lint, including single memories.
    Memory,
    /// Only whole memory files.
    ClaudeFile,
}

/// Registry entry describing a rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintRule {
    /// Unique rule id, also the dispatch key.
    pub id: String,
    /// Human readable name.
    pub name: String,
    /// What the rule checks.
    pub description: String,
    /// Severity of the issues it emits.
    pub severity: LintSeverity,
    /// Rule category.
    pub category: LintCategory,
    /// Entry point the rule belongs to.
    pub scope: LintScope,
    /// Disabled rules are skipped.
    pub enabled: bool,
}

impl LintRule {
    /// Build an enabled rule.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        severity: LintSeverity,
        category: LintCategory,
        scope: LintScope,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            severity,
            category,
            scope,
            enabled: true,
        }
    }

    /// Issue at this rule's severity.
    #[must_use]
    pub fn issue(&self, message: impl Into<String>) -> LintIssue {
        LintIssue {
            rule_id: self.id.clone(),
            severity: self.severity,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Issue at an explicit severity.
    #[must_use]
    pub fn issue_with(&self, severity: LintSeverity, message: impl Into<String>) -> LintIssue {
        LintIssue {
            severity,
            ..self.issue(message)
        }
    }
}

/// A problem found by a rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintIssue {
    /// Rule that produced the issue.
    pub rule_id: String,
    /// Issue severity.
    pub severity: LintSeverity,
    /// Description of the problem.
    pub message: String,
    /// How to fix it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl LintIssue {
    /// Attach a fix suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Check function registered under a rule id.
pub type RuleCheck = Arc<dyn Fn(&str, &LintRule) -> MemoryResult<Vec<LintIssue>> + Send + Sync>;

/// Memories shorter than this (trimmed chars) are flagged.
pub const MIN_MEMORY_CHARS: usize = 20;
/// Memories longer than this (chars) are flagged.
pub const MAX_MEMORY_CHARS: usize = 500;
/// Sentences longer than this (chars) are flagged.
pub const MAX_SENTENCE_CHARS: usize = 100;

const VAGUE_PATTERN: &str = r"(?i)\b(thing|things|stuff|something|etc|various)\b";
const COMMAND_PATTERN: &str =
    r"(?m)(?:^|\s)((?:npm|npx|yarn|pnpm|cargo|git|docker|kubectl|pip|make|python|node)\s+[\w:-]+)";
const INLINE_CODE_PATTERN: &str = r"(?s)```.*?```|`[^`\n]*`";
const CONTEXT_PATTERN: &str =
    r"(?i)\b(because|since|so that|due to|when|if|unless|before|after|for example|e\.g)\b";
const IMPORT_PATTERN: &str = r"(?:^|\s)@(\S+)";
const HEADER_PATTERN: &str = r"(?m)^(#{1,6})\s+\S";

/// Built-in rules in registry order with their checks.
///
/// # Errors
/// Returns an error if a rule pattern fails to compile.
pub fn builtin_rules() -> MemoryResult<Vec<(LintRule, RuleCheck)>> {
    Ok(vec![
        (
            LintRule::new(
                "specificity",
                "Specificity",
                "Flags vague words that hide the actual detail",
                LintSeverity::Warning,
                LintCategory::Specificity,
                LintScope::Memory,
            ),
            specificity_check(Regex::new(VAGUE_PATTERN)?),
        ),
        (
            LintRule::new(
                "length",
                "Length",
                "Flags memories that are empty, too short or too long",
                LintSeverity::Warning,
                LintCategory::Length,
                LintScope::Memory,
            ),
            plain(check_length),
        ),
        (
            LintRule::new(
                "clarity",
                "Clarity",
                "Flags overly long sentences",
                LintSeverity::Info,
                LintCategory::Clarity,
                LintScope::Memory,
            ),
            plain(check_clarity),
        ),
        (
            LintRule::new(
                "duplicate-phrase",
                "Duplicate phrase",
                "Flags three-word phrases repeated within a memory",
                LintSeverity::Warning,
                LintCategory::Redundancy,
                LintScope::Memory,
            ),
            plain(check_duplicate_phrase),
        ),
        (
            LintRule::new(
                "command-formatting",
                "Command formatting",
                "Flags shell commands not wrapped in backticks",
                LintSeverity::Info,
                LintCategory::Formatting,
                LintScope::Memory,
            ),
            command_check(Regex::new(INLINE_CODE_PATTERN)?, Regex::new(COMMAND_PATTERN)?),
        ),
        (
            LintRule::new(
                "context-completeness",
                "Context completeness",
                "Flags instructions that give no reason, condition or example",
                LintSeverity::Info,
                LintCategory::Completeness,
                LintScope::Memory,
            ),
            context_check(Regex::new(CONTEXT_PATTERN)?),
        ),
        (
            LintRule::new(
                "import-syntax",
                "Import syntax",
                "Flags @imports that cannot be resolved as files",
                LintSeverity::Warning,
                LintCategory::Syntax,
                LintScope::ClaudeFile,
            ),
            import_check(Regex::new(IMPORT_PATTERN)?),
        ),
        (
            LintRule::new(
                "header-structure",
                "Header structure",
                "Flags missing or skipped markdown heading levels",
                LintSeverity::Info,
                LintCategory::Structure,
                LintScope::ClaudeFile,
            ),
            header_check(Regex::new(HEADER_PATTERN)?),
        ),
    ])
}

fn plain(check: fn(&str, &LintRule) -> MemoryResult<Vec<LintIssue>>) -> RuleCheck {
    Arc::new(check)
}

fn specificity_check(vague: Regex) -> RuleCheck {
    Arc::new(move |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
        let mut found: Vec<String> = Vec::new();
        for hit in vague.find_iter(content) {
            let word = hit.as_str().to_lowercase();
            if !found.contains(&word) {
                found.push(word);
            }
        }
        if found.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![
            rule.issue(format!("Vague wording: {}", found.join(", ")))
                .with_suggestion("Name the concrete file, command, value or component"),
        ])
    })
}

fn check_length(content: &str, rule: &LintRule) -> MemoryResult<Vec<LintIssue>> {
    let trimmed = content.trim().chars().count();
    if trimmed == 0 {
        return Ok(vec![
            rule.issue_with(LintSeverity::Error, "Memory is empty")
                .with_suggestion("Write down the fact or instruction to remember"),
        ]);
    }
    if trimmed < MIN_MEMORY_CHARS {
        return Ok(vec![
            rule.issue(format!("Memory is only {trimmed} characters long"))
                .with_suggestion("Add enough detail to be useful out of context"),
        ]);
    }
    if content.chars().count() > MAX_MEMORY_CHARS {
        return Ok(vec![
            rule.issue_with(
                LintSeverity::Info,
                format!("Memory exceeds {MAX_MEMORY_CHARS} characters"),
            )
            .with_suggestion("Split it into several focused memories"),
        ]);
    }
    Ok(Vec::new())
}

fn check_clarity(content: &str, rule: &LintRule) -> MemoryResult<Vec<LintIssue>> {
    let long = split_sentences(content)
        .into_iter()
        .filter(|sentence| sentence.chars().count() > MAX_SENTENCE_CHARS)
        .count();
    if long == 0 {
        return Ok(Vec::new());
    }
    Ok(vec![
        rule.issue(format!(
            "{long} sentence(s) longer than {MAX_SENTENCE_CHARS} characters"
        ))
        .with_suggestion("Break long sentences into shorter statements"),
    ])
}

fn check_duplicate_phrase(content: &str, rule: &LintRule) -> MemoryResult<Vec<LintIssue>> {
    let words: Vec<String> = content
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let mut seen = HashSet::new();
    let mut reported = Vec::new();
    for window in words.windows(3) {
        let phrase = window.join(" ");
        if !seen.insert(phrase.clone()) && !reported.contains(&phrase) {
            reported.push(phrase);
        }
    }

    Ok(reported
        .into_iter()
        .map(|phrase| {
            rule.issue(format!("Phrase \"{phrase}\" is repeated"))
                .with_suggestion("Remove the repetition")
        })
        .collect())
}

fn command_check(code: Regex, command: Regex) -> RuleCheck {
    Arc::new(move |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
        let prose = code.replace_all(content, " ");
        Ok(command
            .captures_iter(&prose)
            .filter_map(|caps| caps.get(1))
            .map(|hit| {
                let text = hit.as_str();
                rule.issue(format!("Command \"{text}\" is not formatted as code"))
                    .with_suggestion(format!("Wrap it in backticks: `{text}`"))
            })
            .collect())
    })
}

fn context_check(context: Regex) -> RuleCheck {
    Arc::new(move |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
        let words = content.split_whitespace().count();
        if words < 5 || context.is_match(content) {
            return Ok(Vec::new());
        }
        Ok(vec![
            rule.issue("No reason, condition or example is given")
                .with_suggestion("Say why or when this applies, or add an example"),
        ])
    })
}

fn import_check(import: Regex) -> RuleCheck {
    let allowed: Vec<String> = DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(ToString::to_string)
        .collect();
    Arc::new(move |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
        let mut issues = Vec::new();
        for token in import
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
        {
            if token.starts_with("http") {
                continue;
            }
            let path = Path::new(token);
            if path.extension().is_none() {
                issues.push(
                    rule.issue_with(
                        LintSeverity::Info,
                        format!("@{token} has no file extension and will be skipped as an import"),
                    )
                    .with_suggestion("Reference a file such as @docs/notes.md"),
                );
            } else if !has_allowed_extension(path, &allowed) {
                issues.push(
                    rule.issue(format!("@{token} has an extension that cannot be imported"))
                        .with_suggestion(format!(
                            "Use one of {}",
                            DEFAULT_ALLOWED_EXTENSIONS.join(", ")
                        )),
                );
            }
        }
        Ok(issues)
    })
}

fn header_check(header: Regex) -> RuleCheck {
    Arc::new(move |content: &str, rule: &LintRule| -> MemoryResult<Vec<LintIssue>> {
        let levels: Vec<usize> = header
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().len())
            .collect();

        let Some(first) = levels.first() else {
            return Ok(vec![
                rule.issue_with(LintSeverity::Warning, "File has no markdown headings")
                    .with_suggestion("Start with a `# Title` heading"),
            ]);
        };

        let mut issues = Vec::new();
        if *first != 1 {
            issues.push(
                rule.issue(format!("First heading is level {first}, expected level 1"))
                    .with_suggestion("Start with a `# Title` heading"),
            );
        }
        for pair in levels.windows(2) {
            if pair[1] > pair[0] + 1 {
                issues.push(
                    rule.issue(format!(
                        "Heading jumps from level {} to level {}",
                        pair[0], pair[1]
                    ))
                    .with_suggestion("Do not skip heading levels"),
                );
            }
        }
        Ok(issues)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(id: &str, content: &str) -> Vec<LintIssue> {
        let (rule, check) = builtin_rules()
            .unwrap()
            .into_iter()
            .find(|(rule, _)| rule.id == id)
            .unwrap();
        check(content, &rule).unwrap()
    }

    #[test]
    fn test_registry_order() {
        let ids: Vec<String> = builtin_rules()
            .unwrap()
            .into_iter()
            .map(|(rule, _)| rule.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "specificity",
                "length",
                "clarity",
                "duplicate-phrase",
                "command-formatting",
                "context-completeness",
                "import-syntax",
                "header-structure",
            ]
        );
    }

    #[test]
    fn test_specificity_lists_vague_words_once() {
        let issues = run("specificity", "Fix the thing and other stuff, the Thing again");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("thing, stuff"));
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(run("length", "   ")[0].severity, LintSeverity::Error);
        assert_eq!(run("length", "too short")[0].severity, LintSeverity::Warning);
        assert_eq!(run("length", &"word ".repeat(120))[0].severity, LintSeverity::Info);
        assert!(run("length", "This memory has a reasonable length").is_empty());
    }

    #[test]
    fn test_duplicate_phrase() {
        let issues = run(
            "duplicate-phrase",
            "Run the migration first. Then run the migration again.",
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("run the migration"));
    }

    #[test]
    fn test_command_formatting_ignores_code_spans() {
        assert!(run("command-formatting", "Use `npm test` before pushing").is_empty());
        let issues = run("command-formatting", "Use npm test before pushing");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("npm test"));
    }

    #[test]
    fn test_context_completeness() {
        assert!(!run("context-completeness", "Always run the linter locally first").is_empty());
        assert!(run("context-completeness", "Run the linter because CI is slow").is_empty());
        assert!(run("context-completeness", "Short note").is_empty());
    }

    #[test]
    fn test_import_syntax() {
        let issues = run(
            "import-syntax",
            "See @docs/setup.md and @scripts/run.sh, thanks @alice, https://x.io @https://y.io",
        );
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("@scripts/run.sh"));
        assert_eq!(issues[0].severity, LintSeverity::Warning);
        assert!(issues[1].message.contains("@alice"));
        assert_eq!(issues[1].severity, LintSeverity::Info);
    }

    #[test]
    fn test_header_structure() {
        assert_eq!(run("header-structure", "no headings")[0].severity, LintSeverity::Warning);
        assert!(run("header-structure", "# Title\n## Section\n### Detail").is_empty());
        let issues = run("header-structure", "## Start\n#### Deep");
        assert_eq!(issues.len(), 2);
    }
}
