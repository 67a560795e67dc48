//! Transform dispatch by asset type.
//!
//! | kind          | handling                                          |
//! |---------------|---------------------------------------------------|
//! | `script`      | minify + mangle each member, join with newlines   |
//! | `stylesheet`  | minify each member, rewrite sub-resource URLs     |
//! | `raster-png`  | PNG optimizer on a scratch copy                   |
//! | `raster-jpeg` | JPEG optimizer on a scratch copy                  |
//! | `passthrough` | bytes as-is                                       |
//!
//! Stylesheets report the sub-resources they reference; publishing those is
//! up to the caller, which must finish them before uploading the parent.

mod raster;
mod script;
mod stylesheet;

use std::path::{Path, PathBuf};

use crate::asset::{ResolvedAsset, TransformKind};
use crate::error::{CdnError, Result};
use crate::logger::Logger;
use crate::utils::path::to_slash;

pub use raster::{INPUT_VAR, optimize, resolve_args};
pub use script::transform_script;
pub use stylesheet::{StylesheetOutput, rewrite_urls, transform_stylesheet};

/// External optimizer command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    pub png: Vec<String>,
    pub jpeg: Vec<String>,
}

impl Default for Tools {
    fn default() -> Self {
        let strings = |args: &[&str]| args.iter().map(|s| s.to_string()).collect();
        Self {
            png: strings(&["optipng", "-quiet"]),
            jpeg: strings(&[
                "jpegtran", "-copy", "none", "-optimize", "-outfile", INPUT_VAR, INPUT_VAR,
            ]),
        }
    }
}

/// Publish-ready bytes for one artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transformed {
    pub bytes: Vec<u8>,
    /// Public-root-relative keys of referenced sub-resources.
    pub resources: Vec<String>,
}

impl From<Vec<u8>> for Transformed {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            resources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Transformer {
    public_root: PathBuf,
    tools: Tools,
    logger: Logger,
}

impl Transformer {
    pub fn new(public_root: impl Into<PathBuf>, tools: Tools, logger: Logger) -> Self {
        Self {
            public_root: public_root.into(),
            tools,
            logger,
        }
    }

    pub async fn transform(&self, asset: &ResolvedAsset) -> Result<Transformed> {
        let kind = asset.asset_type.transform();
        self.logger
            .debug("transform", &format!("{} ({})", asset.name, kind.as_str()));

        match kind {
            TransformKind::Script => {
                Ok(transform_script(&asset.files, &self.public_root).await?.into())
            }
            TransformKind::Stylesheet => {
                let out =
                    transform_stylesheet(&asset.files, &self.public_root, asset.artifact_dir())
                        .await?;
                Ok(Transformed {
                    bytes: out.css.into_bytes(),
                    resources: out.resources,
                })
            }
            TransformKind::RasterPng => {
                let bytes = optimize(&self.tools.png, single(asset)?, &self.logger).await?;
                Ok(bytes.into())
            }
            TransformKind::RasterJpeg => {
                let bytes = optimize(&self.tools.jpeg, single(asset)?, &self.logger).await?;
                Ok(bytes.into())
            }
            TransformKind::Passthrough => {
                let path = single(asset)?;
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| CdnError::io(path, e))?;
                Ok(bytes.into())
            }
        }
    }
}

fn single(asset: &ResolvedAsset) -> Result<&Path> {
    asset
        .files
        .first()
        .map(PathBuf::as_path)
        .ok_or(CdnError::EmptyBundle)
}

/// Run CPU-bound or blocking filesystem work off the async workers.
pub(crate) async fn blocking<T, F>(name: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CdnError::Task {
            name: name.to_string(),
            message: e.to_string(),
        })
}

/// Public-root-relative `/` path for messages and URL resolution.
pub(crate) fn display_path(public_root: &Path, file: &Path) -> String {
    file.strip_prefix(public_root)
        .map_or_else(|_| file.to_string_lossy().into_owned(), to_slash)
}

pub(crate) async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CdnError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetReference, resolve};
    use std::fs;
    use tempfile::TempDir;

    fn transformer(root: &Path) -> Transformer {
        let tools = Tools {
            png: vec!["true".to_string()],
            jpeg: vec!["true".to_string()],
        };
        Transformer::new(root, tools, Logger::silent())
    }

    #[tokio::test]
    async fn test_dispatch_by_type() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("fonts")).unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("fonts/x.woff"), b"wOFF").unwrap();
        fs::write(dir.path().join("img/a.png"), b"png").unwrap();
        fs::write(dir.path().join("img/b.jpg"), b"jpg").unwrap();
        let transformer = transformer(dir.path());

        for (path, expected) in [
            ("/fonts/x.woff", &b"wOFF"[..]),
            ("/img/a.png", b"png"),
            ("/img/b.jpg", b"jpg"),
        ] {
            let asset = resolve(&AssetReference::Single(path.into()), dir.path()).unwrap();
            let out = transformer.transform(&asset).await.unwrap();
            assert_eq!(out.bytes, expected, "{path}");
            assert!(out.resources.is_empty());
        }
    }

    #[tokio::test]
    async fn test_stylesheet_reports_resources() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(
            dir.path().join("css/site.css"),
            ".a { background: url(../img/a.png); }",
        )
        .unwrap();

        let asset = resolve(&AssetReference::Single("/css/site.css".into()), dir.path()).unwrap();
        let out = transformer(dir.path()).transform(&asset).await.unwrap();
        assert_eq!(out.resources, vec!["img/a.png"]);
        assert!(String::from_utf8(out.bytes).unwrap().contains("../img/a.png"));
    }

    #[test]
    fn test_display_path() {
        let root = Path::new("/site/public");
        assert_eq!(
            display_path(root, Path::new("/site/public/js/app.js")),
            "js/app.js"
        );
        assert_eq!(display_path(root, Path::new("/elsewhere/a.js")), "/elsewhere/a.js");
    }
}
