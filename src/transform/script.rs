//! Script bundles: newline-joined members, minified and mangled.

use std::path::{Path, PathBuf};

use crate::asset::minify::{is_preminified, minify_js};
use crate::error::{CdnError, Result};

use super::{blocking, display_path, read_text};

/// Members are minified one by one so a syntax error names its file.
pub async fn transform_script(files: &[PathBuf], public_root: &Path) -> Result<Vec<u8>> {
    let mut parts = Vec::with_capacity(files.len());

    for file in files {
        let source = read_text(file).await?;
        if is_preminified(file) {
            parts.push(source);
            continue;
        }

        let name = display_path(public_root, file);
        let minified = blocking(&name, move || minify_js(&source)).await?;
        parts.push(minified.map_err(|message| CdnError::Minify {
            file: name,
            message,
        })?);
    }

    Ok(parts.join("\n").into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bundle_concatenates_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        fs::write(&a, "window.first = function () { return 1; };\n").unwrap();
        fs::write(&b, "window.second = function () { return 2; };\n").unwrap();

        let out = transform_script(&[a, b], dir.path()).await.unwrap();
        let out = String::from_utf8(out).unwrap();
        let first = out.find("window.first").unwrap();
        let second = out.find("window.second").unwrap();
        assert!(first < second, "{out}");
        assert!(out.contains('\n'));
    }

    #[tokio::test]
    async fn test_preminified_is_kept_verbatim() {
        let dir = TempDir::new().unwrap();
        let vendor = dir.path().join("vendor.min.js");
        fs::write(&vendor, "var   keep = 1 ;").unwrap();

        let out = transform_script(&[vendor], dir.path()).await.unwrap();
        assert_eq!(out, b"var   keep = 1 ;");
    }

    #[tokio::test]
    async fn test_syntax_error_names_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("js")).unwrap();
        let good = dir.path().join("js/good.js");
        let bad = dir.path().join("js/broken.js");
        fs::write(&good, "var ok = 1;").unwrap();
        fs::write(&bad, "function (").unwrap();

        let err = transform_script(&[good, bad], dir.path()).await.unwrap_err();
        assert!(matches!(err, CdnError::Minify { ref file, .. } if file == "js/broken.js"));
    }
}
