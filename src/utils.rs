//! Path and reference handling shared by the scan and optimize phases.

use std::path::{Component, Path, PathBuf};

/// Check if a reference has a URL scheme (http:, data:, mailto:, ...).
///
/// A valid scheme must have at least one character before the colon and
/// only contain ASCII alphanumerics or `+`, `-`, `.`.
#[inline]
pub fn is_external(reference: &str) -> bool {
    reference.find(':').is_some_and(|pos| {
        pos > 0
            && reference[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Fold `.` and `..` segments lexically, without touching the filesystem.
/// Files in the build directory are rewritten in place, so their identity
/// must stay stable across the run even before they exist on disk.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Resolve an `href`/`src`/import reference to a normalized file path.
///
/// Root-relative references (`/x`) resolve against the build root; all
/// others resolve against the referencing file's own directory. External
/// URLs, protocol-relative references, and bare fragments yield `None`:
/// only literal local paths are followed. Query strings and fragments are
/// stripped first.
pub fn resolve_reference(reference: &str, file: &Path, root: &Path) -> Option<PathBuf> {
    let reference = reference.trim();
    if reference.is_empty()
        || reference.starts_with('#')
        || reference.starts_with("//")
        || is_external(reference)
    {
        return None;
    }

    let reference = reference.split(['?', '#']).next().unwrap_or(reference);
    if reference.is_empty() {
        return None;
    }

    let joined = match reference.strip_prefix('/') {
        Some(rooted) => root.join(rooted),
        None => file.parent().unwrap_or(root).join(reference),
    };
    Some(normalize_path(&joined))
}

/// Project-relative URL (leading slash) for a path under `root`.
/// Falls back to the full path when the file escaped the root.
pub fn url_for(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = rel.display().to_string().replace('\\', "/");
    format!("/{}", rel.trim_start_matches('/'))
}

/// Root-relative display form for log lines.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
