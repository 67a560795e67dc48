//! External command execution utilities.
//!
//! Provides a Builder-based API for running optimizer tools asynchronously.
//! Output is collected until the process exits, then forwarded to the
//! logger line by line.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let output = Cmd::from_slice(&["optipng", "-quiet", "a.png"])
//!     .cwd(&scratch)
//!     .filter(&NOISE)
//!     .run(&logger)
//!     .await?;
//! ```

use crate::logger::Logger;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Output, Stdio},
    sync::OnceLock,
};
use tokio::process::Command;

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create from a command array (e.g., `["optipng", "-quiet"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set output filter for logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Get the program name for error messages.
    fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command, wait for exit and log its output.
    ///
    /// A non-zero exit status is an error carrying the tool's stderr.
    pub async fn run(self, logger: &Logger) -> Result<Output> {
        let name = self.program_name();
        let filter = self.filter.unwrap_or(&EMPTY_FILTER);

        let resolved = which::which(&self.program)
            .with_context(|| format!("`{name}` not found in PATH"))?;

        let mut cmd = Command::new(resolved);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to execute `{name}`"))?;

        if !output.status.success() {
            anyhow::bail!(format_error(&name, &output, filter));
        }

        filter.log(logger, &name, &String::from_utf8_lossy(&output.stdout));
        filter.log(logger, &name, &String::from_utf8_lossy(&output.stderr));
        Ok(output)
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known warnings or irrelevant messages.
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Check if a line should be skipped.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, logger: &Logger, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .map(strip_ansi)
            .filter(|line| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !self.should_skip(trimmed)
            })
            .collect();

        if !lines.is_empty() {
            logger.debug(name, &lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    if !error_msg.is_empty() {
        msg.push('\n');
        msg.push_str(error_msg);
    }

    let stdout_trimmed = stdout.trim();
    if !stdout_trimmed.is_empty() {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout_trimmed);
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    static NOISE: FilterRule = FilterRule::new(&["** Processing:", "Output IDAT"]);

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::from_slice(&["jpegtran", "-copy", "none"]).cwd("/tmp");

        assert_eq!(cmd.program, OsString::from("jpegtran"));
        assert_eq!(cmd.args.len(), 2);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_filter_rule() {
        assert!(NOISE.should_skip("** Processing: a.png"));
        assert!(!NOISE.should_skip("error: bad file"));
        assert!(NOISE.should_skip(""));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }

    #[tokio::test]
    async fn test_simple_command_logs_stdout() {
        let (logger, lines) = Logger::capture();
        let output = Cmd::from_slice(&["echo", "hello"]).run(&logger).await.unwrap();
        assert!(output.status.success());
        assert_eq!(lines.lock().as_slice(), ["[echo] hello"]);
    }

    #[tokio::test]
    async fn test_cwd_and_filter_apply() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.png"), b"png").unwrap();
        let (logger, lines) = Logger::capture();
        Cmd::from_slice(&["sh", "-c", "echo '** Processing: a.png'; ls"])
            .cwd(dir.path())
            .filter(&NOISE)
            .run(&logger)
            .await
            .unwrap();

        assert_eq!(lines.lock().as_slice(), ["[sh] a.png"]);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_error() {
        let err = Cmd::from_slice(&["false"]).run(&Logger::silent()).await.unwrap_err();
        assert!(err.to_string().contains("`false` failed"));

        let err = Cmd::from_slice(&["sh", "-c", "echo '** Processing: a.png' >&2; exit 3"])
            .filter(&NOISE)
            .run(&Logger::silent())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.ends_with("\na.png"), "{err}");
    }

    #[tokio::test]
    async fn test_missing_program_is_error() {
        let err = Cmd::from_slice(&["definitely-not-a-real-tool-xyz"])
            .run(&Logger::silent())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
