use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use flate2::read::GzDecoder;
use tempfile::TempDir;

use super::*;
use crate::asset::resolve::mtime_millis;
use crate::storage::MemoryStorage;

struct Site {
    dir: TempDir,
}

impl Site {
    fn new() -> Self {
        let site = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(site.public("")).unwrap();
        fs::create_dir_all(site.views("")).unwrap();
        site
    }

    fn public(&self, path: &str) -> std::path::PathBuf {
        self.dir.path().join("public").join(path)
    }

    fn views(&self, path: &str) -> std::path::PathBuf {
        self.dir.path().join("views").join(path)
    }

    fn write(path: &Path, content: impl AsRef<[u8]>) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn asset(&self, path: &str, content: impl AsRef<[u8]>) {
        Self::write(&self.public(path), content);
    }

    fn view(&self, path: &str, content: &str) {
        Self::write(&self.views(path), content);
    }

    fn manifest(&self) -> std::path::PathBuf {
        self.dir.path().join(".cdnify/manifest.json")
    }

    fn options(&self) -> PipelineOptions {
        let mut options = PipelineOptions::new(self.public(""), self.views(""));
        options.manifest = Some(self.manifest());
        options.retry = RetryPolicy::none();
        options.tools = Tools {
            png: vec!["true".to_string()],
            jpeg: vec!["true".to_string()],
        };
        options
    }
}

fn pipeline(options: PipelineOptions, storage: &Arc<MemoryStorage>) -> Pipeline {
    Pipeline::new(options, storage.clone(), Logger::silent())
}

fn gunzip(body: &[u8]) -> String {
    let mut out = String::new();
    GzDecoder::new(body).read_to_string(&mut out).unwrap();
    out
}

fn set_mtime(path: &Path, millis: u64) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_millis(millis))
        .unwrap();
}

fn bundle_site() -> Site {
    let site = Site::new();
    site.asset("js/a.js", "window.a = function () { return 1; };");
    site.asset("js/b.js", "window.b = function () { return 2; };");
    site.asset("css/site.css", "body {\n  color: red;\n}\n");
    site.view(
        "layout.jade",
        "head\n  != CDN(['/js/a.js', '/js/b.js'])\n  != CDN('/css/site.css')\n",
    );
    site.view(
        "partials/footer.ejs",
        "<%- CDN(['/js/a.js', '/js/b.js'], { async: true }) %>",
    );
    site
}

#[tokio::test]
async fn test_end_to_end_bundle_and_stylesheet() {
    let site = bundle_site();
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(site.options(), &storage).run().await.unwrap();

    assert_eq!(report.assets.len(), 2);
    assert_eq!(report.assets[0].name, "a.js+b.js");
    assert_eq!(report.assets[1].name, "css/site.css");
    assert!(report.assets.iter().all(|r| r.outcome == Outcome::Published));
    assert_eq!(storage.names(), vec!["a.js+b.js", "css/site.css"]);

    let js = gunzip(&storage.object("a.js+b.js").unwrap().body);
    assert!(js.find("window.a").unwrap() < js.find("window.b").unwrap());
    assert_eq!(
        gunzip(&storage.object("css/site.css").unwrap().body),
        "body{color:red}"
    );

    let manifest = Manifest::new(site.manifest()).load().await.unwrap().unwrap();
    assert_eq!(
        manifest,
        vec![
            AssetReference::Bundle(vec!["/js/a.js".into(), "/js/b.js".into()]),
            AssetReference::Single("/css/site.css".into()),
        ]
    );
    assert_eq!(report.manifest, Some(site.manifest()));
}

#[tokio::test]
async fn test_manifest_short_circuits_next_run() {
    let site = bundle_site();
    let storage = Arc::new(MemoryStorage::new());
    pipeline(site.options(), &storage).run().await.unwrap();
    let heads = storage.head_calls().len();

    let report = pipeline(site.options(), &storage).run().await.unwrap();
    assert!(report.short_circuited);
    assert!(report.assets.is_empty());
    assert_eq!(storage.head_calls().len(), heads);

    let mut forced = site.options();
    forced.force = true;
    let report = pipeline(forced, &storage).run().await.unwrap();
    assert!(!report.short_circuited);
    assert_eq!(report.fresh(), 2);
    assert_eq!(report.published(), 0);
}

#[tokio::test]
async fn test_mismatched_bundle_before_any_network_call() {
    let site = Site::new();
    site.asset("js/a.js", "var a;");
    site.asset("css/site.css", "a{}");
    site.view("index.jade", "!= CDN(['/js/a.js', '/css/site.css'])");
    let storage = Arc::new(MemoryStorage::new());

    let err = pipeline(site.options(), &storage).run().await.unwrap_err();
    assert!(matches!(err, CdnError::MismatchedBundle { .. }));
    assert!(err.is_configuration());
    assert!(storage.head_calls().is_empty());
    assert!(storage.put_calls().is_empty());
    assert!(!site.manifest().exists());
}

#[tokio::test]
async fn test_stylesheet_sub_resource_is_published() {
    let site = Site::new();
    site.asset(
        "css/site.css",
        ".hero {\n  background: url(/images/a.png) no-repeat;\n}\n",
    );
    site.asset("images/a.png", b"PNG data");
    site.view("index.ejs", "<%- CDN('/css/site.css') %>");
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(site.options(), &storage).run().await.unwrap();

    assert_eq!(report.resources.len(), 1);
    assert_eq!(report.resources[0].name, "images/a.png");
    assert_eq!(report.resources[0].outcome, Outcome::Published);
    assert_eq!(report.assets[0].outcome, Outcome::Published);

    let css = gunzip(&storage.object("css/site.css").unwrap().body);
    assert!(css.contains("../images/a.png"), "{css}");
    assert_eq!(gunzip(&storage.object("images/a.png").unwrap().body), "PNG data");
    // Child upload finishes before the parent's.
    assert_eq!(storage.put_calls(), vec!["images/a.png", "css/site.css"]);
}

#[tokio::test]
async fn test_shared_sub_resource_published_once() {
    let site = Site::new();
    site.asset("css/a.css", ".a{background:url(/images/a.png)}");
    site.asset("css/b.css", ".b{background-image:url(../images/a.png)}");
    site.asset("images/a.png", b"png");
    site.view(
        "index.jade",
        "!= CDN('/css/a.css')\n!= CDN('/css/b.css')\n!= CDN('/images/a.png')",
    );
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(site.options(), &storage).run().await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.assets.len(), 3);
    assert!(report.resources.is_empty());
    let image_puts = storage
        .put_calls()
        .into_iter()
        .filter(|name| name == "images/a.png")
        .count();
    assert_eq!(image_puts, 1);
}

#[tokio::test]
async fn test_failed_sub_resource_fails_parent() {
    let site = Site::new();
    site.asset("css/site.css", ".a{background:url(/images/a.png)}");
    site.asset("images/a.png", b"png");
    site.view("index.jade", "!= CDN('/css/site.css')");
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_puts_with([403]);

    let report = pipeline(site.options(), &storage).run().await.unwrap();

    assert!(report.assets[0].outcome.is_failed());
    assert!(report.resources[0].outcome.is_failed());
    assert!(storage.object("css/site.css").is_none());
    assert_eq!(report.manifest, None);
    assert!(!site.manifest().exists());
}

#[tokio::test]
async fn test_upload_failure_withholds_manifest() {
    let site = bundle_site();
    Manifest::new(site.manifest()).write(&[]).await.unwrap();
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_puts_with([500]);

    let mut options = site.options();
    options.concurrency = 1;
    let report = pipeline(options, &storage).run().await.unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.published(), 1);
    assert!(report.assets[0].outcome.is_failed());
    assert!(!site.manifest().exists());

    // Next run retries only what is missing remotely.
    let report = pipeline(site.options(), &storage).run().await.unwrap();
    assert_eq!(report.published(), 1);
    assert_eq!(report.fresh(), 1);
    assert!(site.manifest().exists());
}

#[tokio::test]
async fn test_png_source_untouched_and_rerun_is_fresh() {
    let site = Site::new();
    site.asset("img/logo.png", b"\x89PNG logo");
    let logo = site.public("img/logo.png");
    set_mtime(&logo, 1_500_000_000_000);
    site.view("index.jade", "img(src=CDN('/img/logo.png', { raw: true }))");

    let mut options = site.options();
    options.manifest = None;
    options.tools.png = vec!["touch".to_string()];
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(options.clone(), &storage).run().await.unwrap();
    assert_eq!(report.assets[0].outcome, Outcome::Published);
    assert_eq!(mtime_millis(&logo).unwrap(), 1_500_000_000_000);
    assert_eq!(fs::read(&logo).unwrap(), b"\x89PNG logo");

    let report = pipeline(options, &storage).run().await.unwrap();
    assert_eq!(report.assets[0].outcome, Outcome::Fresh);
    assert_eq!(storage.put_calls().len(), 1);
}

#[tokio::test]
async fn test_broken_script_aborts_run() {
    let site = Site::new();
    site.asset("js/broken.js", "function (");
    site.view("index.jade", "!= CDN('/js/broken.js')");
    let storage = Arc::new(MemoryStorage::new());

    let err = pipeline(site.options(), &storage).run().await.unwrap_err();
    assert!(matches!(err, CdnError::Minify { ref file, .. } if file == "js/broken.js"));
    assert!(storage.put_calls().is_empty());
}

#[tokio::test]
async fn test_freshness_transport_error_is_fatal() {
    let site = bundle_site();
    let storage = Arc::new(MemoryStorage::new());
    storage.fail_heads();

    let err = pipeline(site.options(), &storage).run().await.unwrap_err();
    assert!(matches!(err, CdnError::Freshness { .. }));
}

#[tokio::test]
async fn test_missing_single_is_skipped() {
    let site = Site::new();
    site.view("index.jade", "!= CDN('/img/later.png')");
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(site.options(), &storage).run().await.unwrap();
    assert_eq!(report.assets[0].outcome, Outcome::Skipped);
    assert!(report.is_success());
    assert!(storage.put_calls().is_empty());
    assert!(Manifest::new(site.manifest()).load().await.unwrap().unwrap().is_empty());
}

#[tokio::test]
async fn test_no_markers_is_empty_run() {
    let site = Site::new();
    site.view("index.jade", "p nothing to publish");
    let storage = Arc::new(MemoryStorage::new());

    let report = pipeline(site.options(), &storage).run().await.unwrap();
    assert_eq!(report, RunReport::default());
    assert!(!site.manifest().exists());
}
