//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::asset::{AssetReference, AttrValue, RenderAttributes};
use crate::config::CONFIG_FILE;

/// Publish view assets to a CDN bucket and render their tags
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (searched upward from the current directory)
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE, value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Minify, gzip and upload every asset referenced from the views
    #[command(visible_alias = "p")]
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Print the tag for one asset, or for a bundle of several
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct PublishArgs {
    /// Run the full cycle even if a manifest from a previous run exists
    #[arg(short, long)]
    pub force: bool,

    /// Transform everything but upload to an in-memory store
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Public asset paths; more than one renders a bundle
    #[arg(required = true, value_name = "ASSET")]
    pub assets: Vec<String>,

    /// Extra HTML attribute (`key=value`, or `key` for a boolean flag)
    #[arg(short, long = "attr", value_name = "KEY[=VALUE]")]
    pub attrs: Vec<String>,

    /// Print the URL only
    #[arg(long)]
    pub raw: bool,

    /// Treat a single asset as a one-file bundle, as `CDN(['/a.js'])` does
    #[arg(short, long)]
    pub bundle: bool,

    /// Render CDN URLs regardless of `cdn.production`
    #[arg(long, conflicts_with = "development")]
    pub production: bool,

    /// Render local URLs regardless of `cdn.production`
    #[arg(long)]
    pub development: bool,
}

impl RenderArgs {
    /// Mode override from `--production` / `--development`.
    pub const fn production(&self) -> Option<bool> {
        match (self.production, self.development) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn reference(&self) -> AssetReference {
        if self.bundle {
            AssetReference::Bundle(self.assets.clone())
        } else {
            AssetReference::from_paths(self.assets.iter().cloned())
        }
    }

    pub fn attributes(&self) -> RenderAttributes {
        let mut attributes = RenderAttributes::new();
        for attr in &self.attrs {
            match attr.split_once('=') {
                Some((key, "true")) => attributes.insert(key.trim(), true),
                Some((key, "false")) => attributes.insert(key.trim(), false),
                Some((key, value)) => attributes.insert(key.trim(), AttrValue::from(value)),
                None => attributes.insert(attr.trim(), true),
            }
        }
        if self.raw {
            attributes.insert("raw", true);
        }
        attributes
    }
}
