//! Publish pipeline orchestration.
//!
//! ```text
//! manifest? ──complete──► skip run
//!     │
//!   scan ─► resolve all ─► per artifact (bounded fan-out):
//!                            fresh? ─► transform ─► sub-resources ─► upload
//!     │
//!   manifest write (only when nothing failed)
//! ```
//!
//! Every reference is resolved before the first storage call, so bundle
//! configuration errors abort the run with nothing published.
//!
//! Artifacts are keyed by name for the duration of a run. A sub-resource
//! referenced by several stylesheets, or also referenced from a template, is
//! processed once and every caller awaits the same outcome.

mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use futures_util::future::{BoxFuture, try_join_all};
use futures_util::{StreamExt, TryStreamExt, stream};
use rustc_hash::FxHashSet;
use tokio::sync::OnceCell;

use crate::asset::{AssetReference, AssetType, ResolvedAsset, resolve};
use crate::error::{CdnError, Result};
use crate::freshness::is_fresh;
use crate::logger::Logger;
use crate::publish::{ONE_YEAR, PUBLIC_READ, PublishStatus, Publisher, RetryPolicy};
use crate::scan::Scanner;
use crate::storage::RemoteStorage;
use crate::transform::{Tools, Transformer, blocking};

pub use manifest::Manifest;

/// Everything a run needs besides storage and logging.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub public_root: PathBuf,
    pub views_dir: PathBuf,
    /// Call-like token that marks asset references in templates.
    pub marker: String,
    pub extensions: Vec<String>,
    /// `None` disables the manifest entirely.
    pub manifest: Option<PathBuf>,
    /// Artifacts in flight at once.
    pub concurrency: usize,
    pub retry: RetryPolicy,
    pub max_age: u64,
    pub acl: String,
    pub tools: Tools,
    /// Ignore a complete manifest.
    pub force: bool,
}

impl PipelineOptions {
    pub fn new(public_root: impl Into<PathBuf>, views_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_root: public_root.into(),
            views_dir: views_dir.into(),
            marker: "CDN".to_string(),
            extensions: vec!["jade".to_string(), "ejs".to_string()],
            manifest: None,
            concurrency: 8,
            retry: RetryPolicy::default(),
            max_age: ONE_YEAR,
            acl: PUBLIC_READ.to_string(),
            tools: Tools::default(),
            force: false,
        }
    }
}

/// Final state of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Published,
    /// Remote copy already up to date
    Fresh,
    /// Source file missing locally and not on the remote
    Skipped,
    Failed(String),
}

impl Outcome {
    /// Counts as done for the manifest.
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Published | Self::Fresh)
    }

    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub reference: AssetReference,
    pub name: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// A complete manifest skipped the run.
    pub short_circuited: bool,
    /// Template references in scan order.
    pub assets: Vec<AssetReport>,
    /// Stylesheet sub-resources, sorted by name.
    pub resources: Vec<AssetReport>,
    /// Manifest written at the end of the run.
    pub manifest: Option<PathBuf>,
}

impl RunReport {
    fn all(&self) -> impl Iterator<Item = &AssetReport> {
        self.assets.iter().chain(&self.resources)
    }

    pub fn count(&self, f: impl Fn(&Outcome) -> bool) -> usize {
        self.all().filter(|r| f(&r.outcome)).count()
    }

    pub fn published(&self) -> usize {
        self.count(|o| *o == Outcome::Published)
    }

    pub fn fresh(&self) -> usize {
        self.count(|o| *o == Outcome::Fresh)
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct Pipeline {
    options: PipelineOptions,
    storage: Arc<dyn RemoteStorage>,
    publisher: Publisher,
    transformer: Transformer,
    logger: Logger,
}

impl Pipeline {
    pub fn new(
        options: PipelineOptions,
        storage: Arc<dyn RemoteStorage>,
        logger: Logger,
    ) -> Self {
        let publisher = Publisher::new(Arc::clone(&storage), logger.clone())
            .with_retry(options.retry.clone())
            .with_max_age(options.max_age)
            .with_acl(options.acl.clone());
        let transformer = Transformer::new(
            options.public_root.clone(),
            options.tools.clone(),
            logger.clone(),
        );
        Self {
            options,
            storage,
            publisher,
            transformer,
            logger,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Scan, resolve, check, transform and publish every referenced asset.
    ///
    /// Fatal errors abort the run. Upload failures do not; they show up in
    /// the report and keep the manifest from being written.
    pub async fn run(&self) -> Result<RunReport> {
        let manifest = self.options.manifest.as_ref().map(Manifest::new);
        if let Some(manifest) = &manifest
            && !self.options.force
            && manifest.is_complete().await
        {
            self.logger.log(
                "manifest",
                &format!("{} exists, skipping publish", manifest.path().display()),
            );
            return Ok(RunReport {
                short_circuited: true,
                ..RunReport::default()
            });
        }

        let scanner = Scanner::new(&self.options.marker, &self.options.extensions)?;
        let views = self.options.views_dir.clone();
        let scanned = blocking("scan", move || scanner.scan(&views)).await??;
        if scanned.is_empty() {
            self.logger.log(
                "scan",
                &format!(
                    "no {}(...) markers found under {}",
                    self.options.marker,
                    self.options.views_dir.display()
                ),
            );
            return Ok(RunReport::default());
        }
        self.logger
            .debug("scan", &format!("{} asset reference(s)", scanned.len()));

        let references = scanned.into_iter().map(|entry| entry.reference).collect();
        let resolved = resolve_all(references, &self.options.public_root).await?;

        let run = Run {
            pipeline: self,
            artifacts: DashMap::new(),
        };
        let concurrency = self.options.concurrency.max(1);
        let assets: Vec<AssetReport> = stream::iter(&resolved)
            .map(|asset| run.report(asset, true))
            .buffered(concurrency)
            .try_collect()
            .await?;

        let top_level: FxHashSet<&str> = resolved.iter().map(|a| a.name.as_str()).collect();
        let mut resources: Vec<AssetReport> = run
            .artifacts
            .iter()
            .filter(|entry| !top_level.contains(entry.key().as_str()))
            .filter_map(|entry| {
                let (reference, outcome) = entry.value().get()?.clone();
                Some(AssetReport {
                    reference,
                    name: entry.key().clone(),
                    outcome,
                })
            })
            .collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));

        let mut report = RunReport {
            assets,
            resources,
            ..RunReport::default()
        };

        if let Some(manifest) = manifest {
            if report.is_success() {
                let done: Vec<AssetReference> = report
                    .assets
                    .iter()
                    .filter(|r| r.outcome.is_done())
                    .map(|r| r.reference.clone())
                    .collect();
                manifest.write(&done).await?;
                self.logger.log(
                    "manifest",
                    &format!("{} ({} entries)", manifest.path().display(), done.len()),
                );
                report.manifest = Some(manifest.path().to_path_buf());
            } else {
                manifest.remove().await?;
                self.logger.log(
                    "manifest",
                    &format!("withheld: {} artifact(s) failed", report.failed()),
                );
            }
        }

        Ok(report)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

type ArtifactCell = Arc<OnceCell<(AssetReference, Outcome)>>;

/// Per-run state: one outcome cell per artifact name.
struct Run<'a> {
    pipeline: &'a Pipeline,
    artifacts: DashMap<String, ArtifactCell>,
}

impl Run<'_> {
    async fn report(&self, asset: &ResolvedAsset, follow: bool) -> Result<AssetReport> {
        let outcome = self.artifact(asset, follow).await?;
        Ok(AssetReport {
            reference: asset.reference.clone(),
            name: asset.name.clone(),
            outcome,
        })
    }

    /// Outcome for `asset`, processing it if this is the first request.
    fn artifact<'s>(
        &'s self,
        asset: &'s ResolvedAsset,
        follow: bool,
    ) -> BoxFuture<'s, Result<Outcome>> {
        Box::pin(async move {
            let cell = Arc::clone(&self.artifacts.entry(asset.name.clone()).or_default());
            let (_, outcome) = cell
                .get_or_try_init(|| async {
                    let outcome = self.process(asset, follow).await?;
                    Ok::<_, CdnError>((asset.reference.clone(), outcome))
                })
                .await?;
            Ok(outcome.clone())
        })
    }

    async fn process(&self, asset: &ResolvedAsset, follow: bool) -> Result<Outcome> {
        let pipeline = self.pipeline;
        let logger = &pipeline.logger;

        if is_fresh(pipeline.storage.as_ref(), &asset.name, asset.fingerprint).await? {
            logger.log("fresh", &asset.name);
            return Ok(Outcome::Fresh);
        }
        if !asset.reference.is_bundle() && !asset.files[0].exists() {
            logger.log(
                "missing",
                &format!("{} ({})", asset.name, asset.files[0].display()),
            );
            return Ok(Outcome::Skipped);
        }

        let transformed = pipeline.transformer.transform(asset).await?;

        if follow
            && !transformed.resources.is_empty()
            && let Some(reason) = self.publish_resources(asset, &transformed.resources).await?
        {
            logger.log("failed", &format!("{}: {reason}", asset.name));
            return Ok(Outcome::Failed(reason));
        }

        let status = pipeline
            .publisher
            .publish(&asset.name, &transformed.bytes, asset.mime)
            .await?;
        Ok(match status {
            PublishStatus::Uploaded { .. } => Outcome::Published,
            PublishStatus::Failed { reason, .. } => Outcome::Failed(reason.to_string()),
        })
    }

    /// Publish stylesheet sub-resources and wait for all of them.
    ///
    /// Returns the failure reason if any of them did not make it.
    async fn publish_resources(
        &self,
        parent: &ResolvedAsset,
        keys: &[String],
    ) -> Result<Option<String>> {
        let references = keys
            .iter()
            .map(|key| AssetReference::Single(format!("/{key}")))
            .collect();
        let resolved = resolve_all(references, &self.pipeline.options.public_root).await?;

        let mut children = Vec::with_capacity(resolved.len());
        for (key, child) in keys.iter().zip(resolved) {
            if matches!(child.asset_type, AssetType::Script | AssetType::Stylesheet) {
                self.pipeline.logger.debug(
                    "resource",
                    &format!("{} references {key}, not followed", parent.name),
                );
                continue;
            }
            children.push(child);
        }

        let outcomes =
            try_join_all(children.iter().map(|child| self.artifact(child, false))).await?;
        Ok(children
            .iter()
            .zip(outcomes)
            .find_map(|(child, outcome)| match outcome {
                Outcome::Failed(reason) => {
                    Some(format!("sub-resource {} failed: {reason}", child.name))
                }
                _ => None,
            }))
    }
}

/// Resolve every reference on the blocking pool; mtimes are `stat` calls.
async fn resolve_all(
    references: Vec<AssetReference>,
    public_root: &Path,
) -> Result<Vec<ResolvedAsset>> {
    let public_root = public_root.to_path_buf();
    blocking("resolve", move || {
        references
            .iter()
            .map(|reference| resolve(reference, &public_root))
            .collect()
    })
    .await?
}

#[cfg(test)]
mod tests;
