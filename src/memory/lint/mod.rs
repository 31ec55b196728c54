//! Memory quality linting.

pub mod linter;
pub mod metrics;
pub mod rules;

pub use linter::{LintResult, MemoryLinter};
pub use metrics::{QualityAnalyzer, QualityMetrics};
pub use rules::{
    LintCategory, LintIssue, LintRule, LintScope, LintSeverity, RuleCheck, builtin_rules,
};
