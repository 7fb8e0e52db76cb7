//! Path manipulation utilities for scope checks

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path, resolving `.` and `..` without touching disk.
///
/// `..` never climbs above the root of an absolute path. For relative paths
/// leading `..` components are kept so that an escape stays detectable.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Check whether `path` lies within `root` (both normalized lexically).
///
/// Comparison is per component, so `/project-other` is not within `/project`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize(path).starts_with(normalize(root))
}

/// Canonicalize a path if it exists, otherwise fall back to its lexical form.
pub fn canonical_or_normalized(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| normalize(path))
}

/// Render a path relative to `base` for log output, falling back to the full path.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}
