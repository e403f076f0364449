//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CONFIG_FILE;

/// Headstart post-build optimizer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path
    #[arg(short = 'C', long, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Optimize a build output directory in place
    #[command(visible_alias = "o")]
    Optimize {
        /// Build output directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        #[command(flatten)]
        args: OptimizeArgs,
    },

    /// Scan HTML entry points and print the dependency manifest
    #[command(visible_alias = "s")]
    Scan {
        /// Build output directory
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dir: PathBuf,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

/// Optimize command arguments; unset flags defer to the config file.
#[derive(clap::Args, Debug, Clone)]
pub struct OptimizeArgs {
    /// Minify JavaScript files
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_js: Option<bool>,

    /// Minify CSS files
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_css: Option<bool>,

    /// Minify HTML files
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_html: Option<bool>,

    /// Inject modulepreload hints for module script dependencies
    #[arg(short = 'm', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub preload_modules: Option<bool>,

    /// Merge stylesheets into one combined file and preload it
    #[arg(short = 'c', long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub preload_css: Option<bool>,

    /// Compile target passed to the JS minifier (e.g. es2020)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Additional glob patterns to exclude (repeatable)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}
