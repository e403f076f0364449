//! Scan manifest: which CSS/JS files each HTML entry point depends on.
//!
//! Built once by the scan phase, read-only afterwards. Sets are ordered
//! (`BTreeSet`/`BTreeMap`) so serialization and combined-stylesheet
//! concatenation are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::utils::url_for;

/// Dependencies of one HTML entry point. Paths are absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencySet {
    /// Literal `<script src>` paths found directly in the document.
    pub entry: BTreeSet<PathBuf>,
    /// Literal `<link href>` paths (not transitively expanded).
    pub css: BTreeSet<PathBuf>,
    /// Transitive closure of `entry` through static imports.
    pub js: BTreeSet<PathBuf>,
}

/// The per-run scan manifest plus files generated by the optimize phase.
#[derive(Debug, Default)]
pub struct Manifest {
    /// HTML entry path -> its dependency set.
    pub entries: BTreeMap<PathBuf, DependencySet>,
    /// Files created by this run (e.g. the combined stylesheet).
    pub generated: Vec<PathBuf>,
}

/// Serialized form: entry URLs flattened at the top level next to the
/// `generated` list.
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(flatten)]
    entries: BTreeMap<String, ReportEntry>,
    generated: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    css: Vec<String>,
    js: Vec<String>,
}

impl Manifest {
    /// Union of every entry's stylesheet dependencies, in path order.
    pub fn all_css(&self) -> BTreeSet<&PathBuf> {
        self.entries.values().flat_map(|deps| &deps.css).collect()
    }

    /// Project-relative report with URL keys and sorted URL lists.
    pub fn report(&self, root: &Path) -> Report {
        let entries = self
            .entries
            .iter()
            .map(|(path, deps)| {
                (
                    url_for(path, root),
                    ReportEntry {
                        css: deps.css.iter().map(|p| url_for(p, root)).collect(),
                        js: deps.js.iter().map(|p| url_for(p, root)).collect(),
                    },
                )
            })
            .collect();
        Report {
            entries,
            generated: self.generated.iter().map(|p| url_for(p, root)).collect(),
        }
    }

    /// Serialize the report to `out` as pretty-printed JSON.
    pub fn write(&self, root: &Path, out: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.report(root))?;
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(out, json)
            .with_context(|| format!("failed to write manifest {}", out.display()))
    }
}
