//! Headstart - a post-build optimizer for static site output.

mod cli;
mod config;
mod html;
mod logger;
mod manifest;
mod minify;
mod optimize;
mod preload;
mod scan;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Optimize { dir, args } => {
            logger::set_verbose(args.verbose);
            let mut config = Config::load(&cli.config)?;
            config.apply_cli(args);

            let outcome = optimize::optimize(dir, &config)?;
            if outcome.failed > 0 {
                log!("optimize"; "{} file(s) optimized, {} failed", outcome.processed, outcome.failed);
            } else {
                log!("optimize"; "{} file(s) optimized", outcome.processed);
            }
            Ok(())
        }
        Commands::Scan { dir, pretty } => {
            let config = Config::load(&cli.config)?;
            let manifest = optimize::scan_only(dir, &config)?;
            let report = manifest.report(&dir.canonicalize()?);
            let json = if *pretty {
                serde_json::to_string_pretty(&report)?
            } else {
                serde_json::to_string(&report)?
            };
            println!("{json}");
            Ok(())
        }
    }
}
