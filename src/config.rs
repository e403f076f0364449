//! Optimizer configuration from `headstart.toml` and CLI overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::OptimizeArgs;
use crate::log;

/// Default config file name, searched next to the invocation.
pub const CONFIG_FILE: &str = "headstart.toml";

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file")]
    Toml(#[from] toml::de::Error),
}

/// Root configuration structure representing headstart.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minify `.js`/`.mjs` files in place.
    pub minify_js: bool,
    /// Minify `.css` files in place.
    pub minify_css: bool,
    /// Minify `.html` files in place.
    pub minify_html: bool,
    /// Inject modulepreload hints for each page's module graph.
    pub preload_modules: bool,
    /// Merge discovered stylesheets into one combined file, inject its
    /// link into every page, and drop CSS-proxy modules.
    pub preload_css: bool,
    /// Output path of the combined stylesheet, relative to the build dir.
    pub combined_css: PathBuf,
    /// Output path of the optimize manifest, relative to the build dir.
    pub manifest: PathBuf,
    /// Glob patterns (relative to the build dir) to leave untouched.
    pub exclude: Vec<String>,
    /// Compile target passed through to the JS minifier (e.g. `es2020`).
    pub target: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minify_js: true,
            minify_css: true,
            minify_html: true,
            preload_modules: true,
            preload_css: false,
            combined_css: PathBuf::from("styles/combined.css"),
            // Not `manifest.json`: that name is commonly a PWA manifest
            // in the very directories this tool runs over.
            manifest: PathBuf::from("optimize.json"),
            exclude: Vec::new(),
            target: None,
        }
    }
}

impl Config {
    /// Load configuration from a toml file; a missing file means
    /// defaults. Unknown keys are warned about and ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let (config, ignored) = Self::parse(&raw)?;
        if !ignored.is_empty() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("config"; "ignoring unknown fields in {}: {}", name, ignored.join(", "));
        }
        Ok(config)
    }

    /// Deserialize, collecting the paths of unknown fields.
    fn parse(raw: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(raw);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Fold CLI overrides into the file-loaded configuration.
    pub fn apply_cli(&mut self, args: &OptimizeArgs) {
        if let Some(v) = args.minify_js {
            self.minify_js = v;
        }
        if let Some(v) = args.minify_css {
            self.minify_css = v;
        }
        if let Some(v) = args.minify_html {
            self.minify_html = v;
        }
        if let Some(v) = args.preload_modules {
            self.preload_modules = v;
        }
        if let Some(v) = args.preload_css {
            self.preload_css = v;
        }
        if let Some(target) = &args.target {
            self.target = Some(target.clone());
        }
        self.exclude.extend(args.exclude.iter().cloned());
    }
}
