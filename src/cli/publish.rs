//! `cdnify publish`

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::cli::PublishArgs;
use crate::config::ProjectConfig;
use crate::log;
use crate::logger::Logger;
use crate::pipeline::{AssetReport, Outcome, Pipeline, RunReport};
use crate::storage::{HttpStorage, MemoryStorage, RemoteStorage};

pub async fn publish_assets(config: &ProjectConfig, args: &PublishArgs) -> Result<RunReport> {
    let mut options = config.pipeline_options();
    options.force = args.force;

    let storage: Arc<dyn RemoteStorage> = if args.dry_run {
        // Nothing was really uploaded, so a later run must not skip.
        options.manifest = None;
        options.force = true;
        log!("publish"; "dry run, uploads stay in memory");
        Arc::new(MemoryStorage::new())
    } else {
        let endpoint = config
            .storage
            .endpoint_url()
            .context("storage.endpoint is not set")?;
        Arc::new(HttpStorage::new(
            endpoint,
            config.storage.timeout(),
            config.storage.static_headers(),
        )?)
    };

    let pipeline = Pipeline::new(options, storage, Logger::terminal());
    let report = pipeline.run().await?;
    print_summary(&report);

    if !report.is_success() {
        bail!("{} artifact(s) failed to publish", report.failed());
    }
    Ok(report)
}

fn print_summary(report: &RunReport) {
    if report.short_circuited {
        return;
    }
    for failed in report.assets.iter().chain(&report.resources) {
        if let AssetReport {
            name,
            outcome: Outcome::Failed(reason),
            ..
        } = failed
        {
            log!("failed"; "{name}: {reason}");
        }
    }
    let skipped = report.count(|o| *o == Outcome::Skipped);
    log!(
        "publish";
        "{} published, {} fresh, {} skipped, {} failed",
        report.published(),
        report.fresh(),
        skipped,
        report.failed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_dry_run_transforms_without_manifest() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("public/css")).unwrap();
        fs::create_dir_all(dir.path().join("views")).unwrap();
        fs::write(dir.path().join("public/css/site.css"), "a { color: red; }").unwrap();
        fs::write(dir.path().join("views/index.ejs"), "<%- CDN('/css/site.css') %>").unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[paths]\nmanifest = \"manifest.json\"\n[cdn]\ndomain = \"cdn.example.com\"\n",
        )
        .unwrap();

        let config = ProjectConfig::load(dir.path(), Path::new(CONFIG_FILE)).unwrap();
        let args = PublishArgs {
            force: false,
            dry_run: true,
        };
        let report = publish_assets(&config, &args).await.unwrap();

        assert_eq!(report.published(), 1);
        assert_eq!(report.manifest, None);
        assert!(!dir.path().join("manifest.json").exists());
    }
}
