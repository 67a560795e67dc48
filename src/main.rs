//! cdnify - publish view assets to a CDN bucket.

#![allow(dead_code)]

mod asset;
mod cli;
mod config;
mod error;
mod freshness;
mod logger;
mod pipeline;
mod publish;
mod render;
mod scan;
mod storage;
mod transform;
mod utils;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ProjectConfig, Usage};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to get current working directory")?;
    let mut config = ProjectConfig::load(&cwd, &cli.config)?;
    debug!("config"; "loaded {}", config.config_path.display());

    match &cli.command {
        Commands::Publish { args } => {
            let usage = if args.dry_run {
                Usage::DryRun
            } else {
                Usage::Publish
            };
            config.validate(usage)?;
            cli::publish::publish_assets(&config, args).await.map(|_| ())
        }
        Commands::Render { args } => {
            if let Some(production) = args.production() {
                config.cdn.production = production;
            }
            config.validate(Usage::Render)?;
            print!("{}", cli::render::render_assets(&config, args)?);
            Ok(())
        }
    }
}
