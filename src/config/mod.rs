//! Project configuration management for `cdnify.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── paths      # [paths], [views]
//! │   ├── cdn        # [cdn]
//! │   ├── storage    # [storage]
//! │   └── publish    # [publish], [tools]
//! ├── error          # ConfigError, diagnostics
//! ├── util           # config discovery, path resolution
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The config file is searched upward from the working directory. Its parent
//! directory is the project root; every relative path resolves against it.

mod error;
pub mod section;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use section::{
    CdnConfig, PathsConfig, PublishConfig, StorageConfig, ToolsConfig, ViewsConfig,
};

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::pipeline::PipelineOptions;
use crate::render::RenderOptions;
use util::{find_config_file, resolve_path};

/// Default config file name.
pub const CONFIG_FILE: &str = "cdnify.toml";

/// What the loaded config is about to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Render,
    /// Publish into the in-memory store.
    DryRun,
    Publish,
}

impl Usage {
    const fn scans_views(self) -> bool {
        !matches!(self, Self::Render)
    }

    const fn uploads(self) -> bool {
        matches!(self, Self::Publish)
    }
}

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing cdnify.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub paths: PathsConfig,
    pub views: ViewsConfig,
    pub cdn: CdnConfig,
    pub storage: StorageConfig,
    pub publish: PublishConfig,
    pub tools: ToolsConfig,
}

impl ProjectConfig {
    /// Locate `config_name` upward from `start` and load it.
    pub fn load(start: &Path, config_name: &Path) -> Result<Self, ConfigError> {
        let path = find_config_file(start, config_name)
            .ok_or_else(|| ConfigError::NotFound(config_name.to_path_buf()))?;
        Self::from_path(&path)
    }

    /// Load configuration from file path and resolve its paths.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::parse(&content)?;
        config.finalize(path);
        Ok(config)
    }

    /// Parse configuration from TOML string, paths left as written.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Record the config location and resolve configured paths against it.
    fn finalize(&mut self, config_path: &Path) {
        let config_path = if config_path.is_absolute() {
            config_path.to_path_buf()
        } else {
            std::env::current_dir()
                .unwrap_or_default()
                .join(config_path)
        };
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.paths.public = resolve_path(&root, &self.paths.public);
        self.paths.views = resolve_path(&root, &self.paths.views);
        self.paths.manifest = self
            .paths
            .manifest
            .take()
            .map(|manifest| resolve_path(&root, &manifest));

        self.config_path = config_path;
        self.root = root;
    }

    /// Collect every problem before failing.
    pub fn validate(&self, usage: Usage) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        self.paths.validate(usage.scans_views(), &mut diag);
        self.views.validate(&mut diag);
        if self.cdn.production {
            self.cdn.validate(&mut diag);
        }
        self.storage.validate(usage.uploads(), &mut diag);
        self.publish.validate(&mut diag);
        self.tools.validate(&mut diag);
        diag.into_result()
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new(&self.paths.public, &self.paths.views);
        options.marker = self.views.marker.clone();
        options.extensions = self.views.extensions.clone();
        options.manifest = self.paths.manifest.clone();
        options.concurrency = self.publish.concurrency;
        options.retry = self.publish.retry_policy();
        options.max_age = self.publish.max_age;
        options.acl = self.storage.acl.clone();
        options.tools = self.tools.tools();
        options
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            production: self.cdn.production,
            domain: self.cdn.domain.clone().unwrap_or_default(),
            protocol: self.cdn.protocol,
            public_root: self.paths.public.clone(),
        }
    }
}
