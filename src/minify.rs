//! Asset minification call-outs.
//!
//! JS goes through oxc (parse, compress, mangle, codegen), CSS through
//! lightningcss, HTML through minify-html. Each returns `Some(minified)`
//! on success and `None` when the input does not parse; callers treat
//! `None` as a task failure and leave the file untouched.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use oxc_compat::EngineTargets;

/// Minify JavaScript source code. `target` narrows the emitted syntax
/// (e.g. `es2020`); an unrecognized target falls back to the compressor
/// default.
pub fn minify_js(source: &str, target: Option<&str>) -> Option<String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        return None;
    }
    let mut program = ret.program;

    let mut compress = CompressOptions::smallest();
    if let Some(target) = target.and_then(|t| EngineTargets::from_target(t).ok()) {
        compress.target = target;
    }
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(compress),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Some(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Option<String> {
    let stylesheet = StyleSheet::parse(source, ParserOptions::default()).ok()?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .ok()?;
    Some(result.code)
}

/// Minify an HTML document. Inline CSS is minified too; inline JS is left
/// alone (script files get the full oxc pass separately).
pub fn minify_html(source: &str) -> Option<String> {
    let cfg = minify_html::Cfg {
        minify_css: true,
        minify_js: false,
        keep_closing_tags: true,
        ..minify_html::Cfg::default()
    };
    String::from_utf8(minify_html::minify(source.as_bytes(), &cfg)).ok()
}

/// Whether a `target` config value is understood by the JS minifier.
pub fn target_supported(target: &str) -> bool {
    EngineTargets::from_target(target).is_ok()
}
