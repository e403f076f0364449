//! Optimize orchestration.
//!
//! Pipeline phases:
//! - **Collect** - enumerate the build directory minus exclude globs
//! - **Scan** - build the dependency manifest from all HTML entries
//! - **Transform** - per-file minify/rewrite tasks on the rayon pool,
//!   failures isolated per file
//! - **Finalize** - combined stylesheet (when CSS preloading is on) and
//!   the manifest report
//!
//! The manifest is complete before any transform task runs and is
//! read-only from then on; tasks only ever mutate their own file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;

use crate::config::Config;
use crate::html::{Injection, inject};
use crate::log;
use crate::logger::ProgressLine;
use crate::manifest::Manifest;
use crate::minify;
use crate::preload::preload_modules;
use crate::scan::{self, imports};
use crate::utils::{relative_display, url_for};

/// Result summary of an optimize run.
pub struct Outcome {
    pub manifest: Manifest,
    pub processed: usize,
    pub failed: usize,
}

/// Optimize a build directory in place and write its manifest.
pub fn optimize(dir: &Path, config: &Config) -> Result<Outcome> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("build directory {} not accessible", dir.display()))?;

    if let Some(target) = &config.target
        && !minify::target_supported(target)
    {
        log!("config"; "unknown JS target `{}`, using the minifier default", target);
    }

    let excludes = build_excludes(config)?;
    let files = collect_files(&root, &excludes)?;

    let html_files: Vec<PathBuf> = files
        .iter()
        .filter(|path| task_kind(path) == Some("html"))
        .cloned()
        .collect();
    let mut manifest = scan::scan_entry_points(&html_files, &root)?;
    crate::debug!("scan"; "{} entry points, {} stylesheets",
        manifest.entries.len(), manifest.all_css().len());

    let count = |kind| files.iter().filter(|p| task_kind(p) == Some(kind)).count();
    let progress = ProgressLine::new(&[
        ("css", count("css")),
        ("js", count("js")),
        ("html", count("html")),
    ]);

    let failed = AtomicUsize::new(0);
    let run_wave = |wave: &[&PathBuf]| {
        wave.par_iter().for_each(|path| {
            let Some(kind) = task_kind(path) else {
                return;
            };
            match optimize_file(path, &root, config, &manifest) {
                Ok(()) => progress.inc(kind),
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log!("error"; "{}: {:#}", relative_display(path, &root), e);
                }
            }
        });
    };

    // Assets first, pages second: the preload planner re-reads module
    // files, so page tasks must not overlap with JS rewrites.
    let (pages, assets): (Vec<_>, Vec<_>) = files
        .iter()
        .partition(|path| task_kind(path) == Some("html"));
    run_wave(&assets);
    run_wave(&pages);
    progress.finish();

    if config.preload_css {
        write_combined_css(&root, config, &mut manifest)?;
    }
    manifest.write(&root, &root.join(&config.manifest))?;

    let tasks = files.iter().filter(|p| task_kind(p).is_some()).count();
    let failed = failed.into_inner();
    Ok(Outcome {
        manifest,
        processed: tasks - failed,
        failed,
    })
}

/// Scan without touching any file (the `scan` subcommand).
pub fn scan_only(dir: &Path, config: &Config) -> Result<Manifest> {
    let root = dir
        .canonicalize()
        .with_context(|| format!("build directory {} not accessible", dir.display()))?;
    let excludes = build_excludes(config)?;
    let html_files: Vec<PathBuf> = collect_files(&root, &excludes)?
        .into_iter()
        .filter(|path| task_kind(path) == Some("html"))
        .collect();
    scan::scan_entry_points(&html_files, &root)
}

/// Which optimize task a file belongs to, by extension.
fn task_kind(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("css") => Some("css"),
        Some("js" | "mjs") => Some("js"),
        Some("html" | "htm") => Some("html"),
        _ => None,
    }
}

/// `*.min.js` / `*.min.css` are upstream artifacts, already minified.
fn is_preminified(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(".min"))
}

fn optimize_file(path: &Path, root: &Path, config: &Config, manifest: &Manifest) -> Result<()> {
    match task_kind(path) {
        Some("css") => optimize_css(path, config),
        Some("js") => optimize_js(path, config),
        Some("html") => optimize_html(path, root, config, manifest),
        _ => Ok(()),
    }
}

fn optimize_css(path: &Path, config: &Config) -> Result<()> {
    if !config.minify_css || is_preminified(path) {
        return Ok(());
    }
    let source = fs::read_to_string(path)?;
    let minified = minify::minify_css(&source).ok_or_else(|| anyhow!("stylesheet failed to parse"))?;
    write_if_changed(path, &source, &minified)
}

fn optimize_js(path: &Path, config: &Config) -> Result<()> {
    // With CSS preloading active the combined stylesheet replaces what
    // the proxy modules would inject; the proxies themselves stay as-is.
    if config.preload_css && imports::is_css_proxy(path) {
        return Ok(());
    }
    if is_preminified(path) {
        return Ok(());
    }

    let source = fs::read_to_string(path)?;
    let mut output = source.clone();
    if config.preload_css
        && let Some(stripped) = imports::strip_css_proxy_imports(&output)
    {
        output = stripped;
    }
    if config.minify_js {
        output = minify::minify_js(&output, config.target.as_deref())
            .ok_or_else(|| anyhow!("module failed to parse"))?;
    }
    write_if_changed(path, &source, &output)
}

fn optimize_html(path: &Path, root: &Path, config: &Config, manifest: &Manifest) -> Result<()> {
    let source = fs::read_to_string(path)?;
    let mut doc = source.clone();

    if config.preload_css && !manifest.all_css().is_empty() {
        let url = url_for(&root.join(&config.combined_css), root);
        // Skip pages that already reference the combined stylesheet, so
        // a second run does not stack duplicate links.
        if !doc.contains(&url) {
            let link = format!("<link rel=\"stylesheet\" href=\"{url}\">");
            doc = inject(
                &doc,
                Injection {
                    head_end: Some(&link),
                    body_end: None,
                },
            );
        }
    }
    if config.preload_modules {
        doc = preload_modules(&doc, path, root, config.preload_css)?;
    }
    if config.minify_html {
        doc = minify::minify_html(&doc).ok_or_else(|| anyhow!("document failed to minify"))?;
    }
    write_if_changed(path, &source, &doc)
}

fn write_if_changed(path: &Path, before: &str, after: &str) -> Result<()> {
    if before != after {
        fs::write(path, after).with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

/// Merge every discovered stylesheet into the configured combined file.
/// Runs after the task pool has settled, so an unreadable sheet is
/// skipped with a warning instead of failing the run.
fn write_combined_css(root: &Path, config: &Config, manifest: &mut Manifest) -> Result<()> {
    let out = root.join(&config.combined_css);
    // On a re-run the pages already link the combined file; it must not
    // concatenate itself.
    let sheets: Vec<_> = manifest
        .all_css()
        .into_iter()
        .filter(|sheet| **sheet != out)
        .collect();
    if sheets.is_empty() {
        return Ok(());
    }

    let mut combined = String::new();
    for sheet in sheets {
        match fs::read_to_string(sheet) {
            Ok(css) => {
                combined.push_str(&css);
                if !css.ends_with('\n') {
                    combined.push('\n');
                }
            }
            Err(e) => {
                log!("error"; "combined stylesheet skips {}: {}", relative_display(sheet, root), e);
            }
        }
    }
    if config.minify_css
        && let Some(minified) = minify::minify_css(&combined)
    {
        combined = minified;
    }

    let out = root.join(&config.combined_css);
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, combined)
        .with_context(|| format!("failed to write combined stylesheet {}", out.display()))?;
    manifest.generated.push(out);
    Ok(())
}

fn build_excludes(config: &Config) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in &config.exclude {
        builder.add(
            Glob::new(pattern).with_context(|| format!("invalid exclude glob `{pattern}`"))?,
        );
    }
    // The optimizer's own outputs are never inputs.
    for own in [&config.manifest, &config.combined_css] {
        let pattern = own.display().to_string().replace('\\', "/");
        builder.add(Glob::new(&pattern)?);
    }
    Ok(builder.build()?)
}

/// Enumerate regular files under `root`, exclude-filtered. Any walk error
/// is fatal: an incomplete inventory would break the manifest contract.
fn collect_files(root: &Path, excludes: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in jwalk::WalkDir::new(root).skip_hidden(false).sort(true) {
        let entry = entry.context("failed to enumerate build directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if excludes.is_match(rel) {
            continue;
        }
        files.push(path);
    }
    Ok(files)
}
