//! Recursive `@path` import resolution.
//!
//! A document may reference other documents with `@relative/or/absolute.md`
//! tokens. Resolution walks those references depth-first in declaration
//! order using an explicit stack of frames. Each frame carries its own copy of
//! the paths visited on its branch, so diamond imports are allowed while real
//! back-edges are cut.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::imports::paths::{has_allowed_extension, normalize_path};

/// Default maximum nesting depth below the root document.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// Extensions importable by default.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[".md", ".txt", ".yaml", ".yml", ".json"];

/// One successfully read document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedContent {
    /// Normalized absolute path.
    pub path: PathBuf,
    /// File contents.
    pub content: String,
    /// Depth at which the file was first expanded (root is 0).
    pub depth: usize,
    /// When the file was read.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// Per-call options for [`ImportResolver::resolve_imports`].
#[derive(Clone, Debug)]
pub struct ImportOptions {
    /// Maximum nesting depth below the root document.
    pub max_depth: usize,
    /// Importable extensions, with or without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Directory relative tokens resolve against; the importing file's
    /// directory when unset.
    pub base_path: Option<PathBuf>,
    /// Reads still pending at this instant are abandoned.
    pub deadline: Option<Instant>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            base_path: None,
            deadline: None,
        }
    }
}

impl ImportOptions {
    /// Set the maximum depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the base path for relative imports.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// Abandon reads still pending at `deadline`.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Abandon reads still pending `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// Pending unit of work on the resolution stack.
struct Frame {
    path: PathBuf,
    depth: usize,
    visited: HashSet<PathBuf>,
}

/// Resolves `@path` imports with a cross-call content cache.
///
/// A file's imports are expanded only the first time this resolver reads it;
/// later references, from any root, yield the cached node alone.
pub struct ImportResolver {
    cache: HashMap<PathBuf, ImportedContent>,
    dependencies: HashMap<PathBuf, BTreeSet<String>>,
    import_pattern: Regex,
}

impl ImportResolver {
    /// Create a resolver with an empty cache.
    ///
    /// # Errors
    /// Returns an error if the import pattern is invalid.
    pub fn new() -> MemoryResult<Self> {
        Ok(Self {
            cache: HashMap::new(),
            dependencies: HashMap::new(),
            import_pattern: Regex::new(r"@(\S+)")?,
        })
    }

    /// Resolve `path` and its imports into a depth-first pre-order list.
    ///
    /// Nested failures (cycle, depth, disallowed extension, missing target,
    /// unreadable file, deadline) are logged and skipped.
    ///
    /// # Errors
    /// Returns an error only if the root document cannot be read in time.
    pub async fn resolve_imports(
        &mut self,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> MemoryResult<Vec<ImportedContent>> {
        let cwd = std::env::current_dir()?;
        let base = options
            .base_path
            .as_deref()
            .map(|base| normalize_path(base, &cwd));
        let root = normalize_path(path.as_ref(), base.as_deref().unwrap_or(cwd.as_path()));

        let mut resolved = Vec::new();
        let mut stack = vec![Frame {
            path: root.clone(),
            depth: 0,
            visited: HashSet::new(),
        }];

        while let Some(frame) = stack.pop() {
            if frame.visited.contains(&frame.path) {
                warn!(
                    path = %frame.path.display(),
                    depth = frame.depth,
                    "Import cycle detected, skipping branch"
                );
                continue;
            }

            if frame.depth > options.max_depth {
                warn!(
                    path = %frame.path.display(),
                    max_depth = options.max_depth,
                    "Import depth exceeded, skipping branch"
                );
                continue;
            }

            if let Some(cached) = self.cache.get(&frame.path) {
                debug!(path = %frame.path.display(), "Import served from cache");
                resolved.push(cached.clone());
                continue;
            }

            let content = match read_file(&frame.path, options.deadline).await {
                Ok(content) => content,
                Err(err) if frame.depth == 0 => return Err(err),
                Err(err) => {
                    warn!(
                        path = %frame.path.display(),
                        error = %err,
                        "Skipping unreadable import"
                    );
                    continue;
                }
            };

            let tokens = self.import_tokens(&content);
            let node = ImportedContent {
                path: frame.path.clone(),
                content,
                depth: frame.depth,
                timestamp: Utc::now(),
            };
            self.dependencies
                .insert(frame.path.clone(), tokens.iter().cloned().collect());
            self.cache.insert(frame.path.clone(), node.clone());
            resolved.push(node);

            let import_base = match &base {
                Some(base) => base.clone(),
                None => frame
                    .path
                    .parent()
                    .map_or_else(|| cwd.clone(), Path::to_path_buf),
            };
            let mut visited = frame.visited;
            visited.insert(frame.path.clone());

            let mut children = Vec::with_capacity(tokens.len());
            for token in tokens {
                let target = normalize_path(Path::new(&token), &import_base);
                if !has_allowed_extension(&target, &options.allowed_extensions) {
                    warn!(
                        token = %token,
                        from = %frame.path.display(),
                        "Import extension not allowed, skipping"
                    );
                    continue;
                }
                if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
                    warn!(
                        token = %token,
                        from = %frame.path.display(),
                        "Import target not found, skipping"
                    );
                    continue;
                }
                children.push(Frame {
                    path: target,
                    depth: frame.depth + 1,
                    visited: visited.clone(),
                });
            }
            // Reverse so the first declared import is expanded first.
            stack.extend(children.into_iter().rev());
        }

        info!(root = %root.display(), files = resolved.len(), "Resolved imports");
        Ok(resolved)
    }

    /// Raw import tokens found in `path` the last time it was read.
    ///
    /// A relative `path` is looked up the way [`Self::resolve_imports`]
    /// locates its root: against `base_path` when given, the current
    /// directory otherwise.
    #[must_use]
    pub fn dependencies(&self, path: impl AsRef<Path>, base_path: Option<&Path>) -> Vec<String> {
        self.dependencies
            .get(&lookup_key(path.as_ref(), base_path))
            .map(|tokens| tokens.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Cached node for `path`, if it was ever resolved. Relative paths are
    /// looked up as in [`Self::dependencies`].
    #[must_use]
    pub fn cached(
        &self,
        path: impl AsRef<Path>,
        base_path: Option<&Path>,
    ) -> Option<&ImportedContent> {
        self.cache.get(&lookup_key(path.as_ref(), base_path))
    }

    /// Number of cached documents.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop the content cache and the dependency graph.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
        self.dependencies.clear();
    }

    /// `@` tokens in declaration order, excluding those that look like URLs.
    fn import_tokens(&self, content: &str) -> Vec<String> {
        self.import_pattern
            .captures_iter(content)
            .filter_map(|cap| cap.get(1))
            .map(|token| token.as_str())
            .filter(|token| !token.starts_with("http"))
            .map(ToString::to_string)
            .collect()
    }
}

/// Cache key of `path`, normalized as `resolve_imports` normalizes its root.
fn lookup_key(path: &Path, base_path: Option<&Path>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_default();
    let base = base_path.map(|base| normalize_path(base, &cwd));
    normalize_path(path, base.as_deref().unwrap_or(cwd.as_path()))
}

/// Join resolved blocks into a single document, in resolution order.
#[must_use]
pub fn compose(blocks: &[ImportedContent]) -> String {
    blocks
        .iter()
        .map(|block| block.content.trim_end())
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn read_file(path: &Path, deadline: Option<Instant>) -> MemoryResult<String> {
    let read = tokio::fs::read_to_string(path);
    let result = match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, read)
            .await
            .map_err(|_| MemoryError::ImportTimeout(path.to_path_buf()))?,
        None => read.await,
    };
    result.map_err(|source| MemoryError::ImportRead {
        path: path.to_path_buf(),
        source,
    })
}
