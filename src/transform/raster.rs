//! PNG / JPEG optimization through external tools.
//!
//! The tool runs on a copy of the image inside a scratch directory, so the
//! public tree and its modification times are never touched.

use std::ffi::OsStr;
use std::path::Path;

use crate::error::{CdnError, Result};
use crate::logger::Logger;
use crate::utils::exec::{Cmd, FilterRule};

use super::blocking;

/// Placeholder replaced by the image path in tool arguments.
pub const INPUT_VAR: &str = "$INPUT";

/// Progress lines optipng prints on success.
static OPTIMIZER_NOISE: FilterRule = FilterRule::new(&[
    "** Processing:",
    "OptiPNG",
    "Copyright",
    "Input ",
    "Output ",
    "Trying:",
    "Selecting",
    "Optimizing",
    "is already optimized",
]);

/// Command line for `tool` on `path`.
///
/// Every `$INPUT` is substituted; without one the path is appended.
pub fn resolve_args(tool: &[String], path: &Path) -> Vec<String> {
    let input = path.to_string_lossy();
    if tool.iter().any(|arg| arg.contains(INPUT_VAR)) {
        tool.iter().map(|arg| arg.replace(INPUT_VAR, &input)).collect()
    } else {
        let mut args = tool.to_vec();
        args.push(input.into_owned());
        args
    }
}

/// Run `tool` on a scratch copy of `path` and return the optimized bytes.
///
/// An empty tool command publishes the file untouched.
pub async fn optimize(tool: &[String], path: &Path, logger: &Logger) -> Result<Vec<u8>> {
    if tool.is_empty() {
        return read_bytes(path).await;
    }

    let scratch = blocking("optimize", || {
        tempfile::Builder::new().prefix("cdnify-").tempdir()
    })
    .await?
    .map_err(|e| CdnError::io(path, e))?;
    let copy = scratch
        .path()
        .join(path.file_name().unwrap_or(OsStr::new("asset")));
    tokio::fs::copy(path, &copy)
        .await
        .map_err(|e| CdnError::io(path, e))?;

    let args = resolve_args(tool, &copy);
    logger.debug("optimize", &args.join(" "));
    Cmd::from_slice(&args)
        .cwd(scratch.path())
        .filter(&OPTIMIZER_NOISE)
        .run(logger)
        .await
        .map_err(|e| CdnError::Tool {
            tool: tool[0].clone(),
            path: path.to_path_buf(),
            message: format!("{e:#}"),
        })?;

    read_bytes(&copy).await
}

async fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| CdnError::io(path, e))
}
