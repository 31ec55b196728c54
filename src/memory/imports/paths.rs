//! Path normalization for import resolution.

use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `base` and lexically remove `.` and `..`.
///
/// Symlinks are not followed; the target does not need to exist.
#[must_use]
pub fn normalize_path(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Whether `path` carries one of `allowed` extensions (compared case-insensitively,
/// entries given with or without the leading dot).
#[must_use]
pub fn has_allowed_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(extension) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|entry| entry.trim_start_matches('.').eq_ignore_ascii_case(extension))
}
