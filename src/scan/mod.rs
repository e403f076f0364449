//! Dependency discovery for HTML entry points.
//!
//! The token walk collects literal `<link href>` and `<script src>`
//! references; the transitive closure then chases static JS imports until
//! a fixed point, with a visited set for cycle safety. Scanning is pure
//! apart from reading the referenced files.

pub mod imports;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::html::{Lexer, TokenKind, find_attr_value};
use crate::manifest::{DependencySet, Manifest};
use crate::utils::resolve_reference;

/// Scan every HTML entry point into a manifest. One unit of work per
/// file; any unreadable file fails the whole phase, since downstream
/// tasks need a complete manifest.
pub fn scan_entry_points(html_files: &[PathBuf], root: &Path) -> Result<Manifest> {
    let entries = html_files
        .par_iter()
        .map(|file| {
            let source = fs::read_to_string(file)
                .with_context(|| format!("failed to read entry {}", file.display()))?;
            let mut deps = scan_document(&source, file, root);
            deps.js = transitive_modules(&deps.js, root)?;
            Ok((file.clone(), deps))
        })
        .collect::<Result<_>>()?;

    Ok(Manifest {
        entries,
        generated: Vec::new(),
    })
}

/// Single forward token walk over one document. Tags missing the wanted
/// attribute contribute nothing; duplicate references collapse into the
/// sets.
pub fn scan_document(source: &str, file: &Path, root: &Path) -> DependencySet {
    let mut deps = DependencySet::default();
    let mut tokens = Lexer::new(source);

    while let Some(token) = tokens.next() {
        if token.kind != TokenKind::TagOpen {
            continue;
        }
        match token.value.as_ref() {
            "link" => {
                if let Some(href) = find_attr_value(&mut tokens, "href")
                    && let Some(path) = resolve_reference(&href, file, root)
                {
                    deps.css.insert(path);
                }
            }
            "script" => {
                if let Some(src) = find_attr_value(&mut tokens, "src")
                    && let Some(path) = resolve_reference(&src, file, root)
                {
                    deps.entry.insert(path.clone());
                    deps.js.insert(path);
                }
            }
            _ => {}
        }
    }
    deps
}

/// Fixed-point closure of the static import graph seeded from `seeds`.
/// The visited set is owned by this one traversal; it guarantees
/// termination on circular imports and keeps re-visits out.
pub fn transitive_modules(seeds: &BTreeSet<PathBuf>, root: &Path) -> Result<BTreeSet<PathBuf>> {
    let mut all = seeds.clone();
    let mut visited: FxHashSet<PathBuf> = FxHashSet::default();
    let mut queue: Vec<PathBuf> = seeds.iter().cloned().collect();

    while let Some(module) = queue.pop() {
        if !visited.insert(module.clone()) {
            continue;
        }
        for import in imports::static_imports(&module, root)? {
            if all.insert(import.clone()) {
                queue.push(import);
            }
        }
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_document_collects_links_and_scripts() {
        let root = Path::new("/site");
        let file = Path::new("/site/index.html");
        let deps = scan_document(
            "<link rel=\"stylesheet\" href=\"/a.css\"><script src=\"/b.js\"></script>",
            file,
            root,
        );
        assert_eq!(
            deps.css.iter().collect::<Vec<_>>(),
            vec![Path::new("/site/a.css")]
        );
        assert_eq!(
            deps.entry.iter().collect::<Vec<_>>(),
            vec![Path::new("/site/b.js")]
        );
        assert_eq!(deps.js, deps.entry);
    }

    #[test]
    fn test_scan_document_duplicates_collapse() {
        let deps = scan_document(
            "<link href=\"/a.css\"><link href=\"/a.css\"><script src=\"./b.js\"></script>",
            Path::new("/site/index.html"),
            Path::new("/site"),
        );
        assert_eq!(deps.css.len(), 1);
        assert_eq!(deps.js.len(), 1);
    }

    #[test]
    fn test_scan_document_tolerates_attrless_tags() {
        let deps = scan_document(
            "<link rel=\"preconnect\"><script>inline()</script><script src=\"https://cdn/x.js\"></script>",
            Path::new("/site/index.html"),
            Path::new("/site"),
        );
        assert!(deps.css.is_empty());
        assert!(deps.js.is_empty());
    }

    #[test]
    fn test_entry_is_subset_of_js() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), "import './b.js';").unwrap();
        fs::write(root.join("b.js"), "export const b = 1;").unwrap();
        fs::write(
            root.join("index.html"),
            "<html><body><script src=\"/a.js\"></script></body></html>",
        )
        .unwrap();

        let manifest = scan_entry_points(&[root.join("index.html")], root).unwrap();
        let deps = &manifest.entries[&root.join("index.html")];
        assert!(deps.entry.is_subset(&deps.js));
        assert!(deps.js.contains(&root.join("b.js")));
    }

    #[test]
    fn test_transitive_closure_cycle_terminates() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("b.js"), "import './c.js';").unwrap();
        fs::write(root.join("c.js"), "import './b.js';").unwrap();

        let seeds = BTreeSet::from([root.join("b.js")]);
        let all = transitive_modules(&seeds, root).unwrap();
        assert_eq!(all, BTreeSet::from([root.join("b.js"), root.join("c.js")]));
    }

    #[test]
    fn test_scan_unreadable_entry_fails_phase() {
        let dir = TempDir::new().unwrap();
        let result = scan_entry_points(&[dir.path().join("missing.html")], dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_scan_missing_import_fails_phase() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.js"), "import './gone.js';").unwrap();
        fs::write(
            root.join("index.html"),
            "<script src=\"/a.js\"></script>",
        )
        .unwrap();

        assert!(scan_entry_points(&[root.join("index.html")], root).is_err());
    }
}
