//! Module preload planning.
//!
//! For every `<script type="module" src=...>` entry in a document, the
//! planner computes the transitive module set and injects one
//! `modulepreload` hint per *resolved* module (reachable but not declared
//! in the document), plus a fallback module script for engines without
//! preload support. Declared entries are excluded, which also makes the
//! planner idempotent: once injected, the fallbacks count as entries on
//! the next run and nothing new is resolved.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;

use crate::html::{Injection, Lexer, TokenKind, inject, tag_attributes};
use crate::scan::{imports::is_css_proxy, transitive_modules};
use crate::utils::{resolve_reference, url_for};

/// Inject preload hints for the document's module graph. Returns the
/// document unchanged when it declares no module entries or when every
/// reachable module is already declared.
pub fn preload_modules(
    doc: &str,
    file: &Path,
    root: &Path,
    preload_css: bool,
) -> Result<String> {
    let entries = module_entries(doc, file, root);
    if entries.is_empty() {
        return Ok(doc.to_string());
    }

    let all = transitive_modules(&entries, root)?;
    let mut resolved: Vec<String> = all
        .difference(&entries)
        .filter(|module| !(preload_css && is_css_proxy(module)))
        .map(|module| url_for(module, root))
        .collect();
    resolved.sort();

    if resolved.is_empty() {
        return Ok(doc.to_string());
    }

    let mut head = String::from("<!-- preload statically imported modules -->\n");
    let mut body = String::new();
    for url in &resolved {
        head.push_str(&format!("<link rel=\"modulepreload\" href=\"{url}\">\n"));
        // Fallback fetch for engines that ignore modulepreload.
        body.push_str(&format!("<script type=\"module\" src=\"{url}\"></script>\n"));
    }

    Ok(inject(
        doc,
        Injection {
            head_end: Some(&head),
            body_end: Some(&body),
        },
    ))
}

/// Paths of `<script type="module" src=...>` tags. Both attributes must
/// appear on the same tag; a tag missing either is skipped without error.
fn module_entries(doc: &str, file: &Path, root: &Path) -> BTreeSet<std::path::PathBuf> {
    let mut entries = BTreeSet::new();
    let mut tokens = Lexer::new(doc);

    while let Some(token) = tokens.next() {
        if token.kind != TokenKind::TagOpen || token.value != "script" {
            continue;
        }
        let attrs = tag_attributes(&mut tokens);
        let is_module = attrs
            .iter()
            .any(|(name, value)| name == "type" && value == "module");
        let src = attrs
            .iter()
            .find(|(name, _)| name == "src")
            .map(|(_, value)| value.as_str());
        if is_module
            && let Some(src) = src
            && let Some(path) = resolve_reference(src, file, root)
        {
            entries.insert(path);
        }
    }
    entries
}
