//! Static ESM import extraction and CSS-proxy handling.
//!
//! Operates on already-built/transpiled modules, so only literal
//! specifiers matter: `import ... from "x"`, `export ... from "x"`, and
//! `export * from "x"`. Dynamic `import()` and bare package specifiers
//! are upstream concerns and are ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use oxc::allocator::Allocator;
use oxc::ast::ast::Statement;
use oxc::codegen::Codegen;
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::utils::resolve_reference;

/// Extract the resolved file paths of a module's static imports.
///
/// An unreadable file is an error (the caller decides whether that is
/// fatal); a file that fails to parse contributes no imports.
pub fn static_imports(path: &Path, root: &Path) -> Result<Vec<PathBuf>> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read module {}", path.display()))?;
    Ok(extract_specifiers(&source)
        .iter()
        .filter(|specifier| is_local(specifier))
        .filter_map(|specifier| resolve_reference(specifier, path, root))
        .collect())
}

/// Literal specifiers of every static import/re-export in `source`.
fn extract_specifiers(source: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return Vec::new();
    }

    let mut specifiers = Vec::new();
    for statement in &ret.program.body {
        match statement {
            Statement::ImportDeclaration(decl) => {
                specifiers.push(decl.source.value.to_string());
            }
            Statement::ExportAllDeclaration(decl) => {
                specifiers.push(decl.source.value.to_string());
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(source) = &decl.source {
                    specifiers.push(source.value.to_string());
                }
            }
            _ => {}
        }
    }
    specifiers
}

/// Only `./`, `../`, and `/` specifiers are part of the local module
/// graph; bare package names are left to the upstream bundler.
fn is_local(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// A generated JS module standing in for a stylesheet.
pub fn is_css_proxy(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_proxy_name)
}

fn is_proxy_name(name: &str) -> bool {
    name.ends_with(".css.js") || name.ends_with(".css.mjs")
}

/// Drop static imports of CSS-proxy modules from a JS source. Used when
/// the combined stylesheet already supplies the styles the proxies would
/// inject. Returns `None` when nothing had to change (parse failure
/// included).
pub fn strip_css_proxy_imports(source: &str) -> Option<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
    if !ret.errors.is_empty() {
        return None;
    }

    let mut program = ret.program;
    let before = program.body.len();
    program.body.retain(|statement| match statement {
        Statement::ImportDeclaration(decl) => !is_proxy_name(decl.source.value.as_str()),
        _ => true,
    });
    if program.body.len() == before {
        return None;
    }
    Some(Codegen::new().build(&program).code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_specifiers() {
        let source = r#"
            import { a } from "./a.js";
            import b from "../b.js";
            export { c } from "/c.js";
            export * from "./d.js";
            import "pkg";
            const later = await import("./dynamic.js");
        "#;
        assert_eq!(
            extract_specifiers(source),
            vec!["./a.js", "../b.js", "/c.js", "./d.js", "pkg"]
        );
    }

    #[test]
    fn test_static_imports_resolves_and_filters() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("js")).unwrap();
        fs::write(
            root.join("js/app.js"),
            "import './util.js';\nimport '/vendor.js';\nimport 'react';\n",
        )
        .unwrap();

        let imports = static_imports(&root.join("js/app.js"), root).unwrap();
        assert_eq!(
            imports,
            vec![root.join("js/util.js"), root.join("vendor.js")]
        );
    }

    #[test]
    fn test_static_imports_unreadable_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(static_imports(&dir.path().join("missing.js"), dir.path()).is_err());
    }

    #[test]
    fn test_unparseable_module_has_no_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.js"), "import from from;;;(").unwrap();
        let imports = static_imports(&dir.path().join("broken.js"), dir.path()).unwrap();
        assert!(imports.is_empty());
    }

    #[test]
    fn test_is_css_proxy() {
        assert!(is_css_proxy(Path::new("/out/main.css.js")));
        assert!(is_css_proxy(Path::new("/out/theme.css.mjs")));
        assert!(!is_css_proxy(Path::new("/out/main.js")));
        assert!(!is_css_proxy(Path::new("/out/main.css")));
    }

    #[test]
    fn test_strip_css_proxy_imports() {
        let source = "import \"./theme.css.js\";\nimport { x } from \"./x.js\";\nconsole.log(x);\n";
        let stripped = strip_css_proxy_imports(source).unwrap();
        assert!(!stripped.contains("theme.css.js"));
        assert!(stripped.contains("x.js"));
    }

    #[test]
    fn test_strip_css_proxy_imports_unchanged() {
        assert_eq!(strip_css_proxy_imports("import { x } from \"./x.js\";"), None);
    }
}
