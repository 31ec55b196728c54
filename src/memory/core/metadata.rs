//! Metadata and provenance attached to each indexed memory.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a memory came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    /// Composed from an imported document.
    Import,
    /// Ad-hoc note captured by a user.
    Note,
    /// Summary of a recorded task outcome.
    TaskResult,
    /// Added directly through the index API.
    #[default]
    Manual,
}

impl MemorySource {
    /// Stable string for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Note => "note",
            Self::TaskResult => "task_result",
            Self::Manual => "manual",
        }
    }
}

/// Free-form JSON metadata for a memory.
///
/// Two keys carry meaning for ranking: `priority` (`"high"` boosts scores and
/// qualifies for the important scope) and `important` (any truthy value).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryMetadata(pub Map<String, Value>);

impl MemoryMetadata {
    /// Create empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the priority label.
    #[must_use]
    pub fn with_priority(self, priority: &str) -> Self {
        self.with("priority", priority)
    }

    /// Look up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Priority label, if present as a string.
    #[must_use]
    pub fn priority(&self) -> Option<&str> {
        self.0.get("priority").and_then(Value::as_str)
    }

    /// Whether the memory is flagged `priority: "high"`.
    #[must_use]
    pub fn is_high_priority(&self) -> bool {
        self.priority() == Some("high")
    }

    /// Whether `important` holds a truthy value.
    #[must_use]
    pub fn is_important(&self) -> bool {
        self.0.get("important").is_some_and(is_truthy)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no keys are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for MemoryMetadata {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// Loose truthiness: null, false, zero, NaN and the empty string are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
