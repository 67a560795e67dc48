//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only shown with `--verbose`
//! - [`Logger`], an injectable handle the publish pipeline writes through
//!
//! # Example
//!
//! ```ignore
//! log!("publish"; "uploaded {} artifacts", count);
//!
//! let logger = Logger::terminal();
//! logger.log("fresh", "css/site.css");
//! ```

use crossterm::{
    execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    fmt,
    io::{Write, stdout},
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "publish" | "upload" => prefix.bright_blue().bold().to_string(),
        "fresh" | "manifest" => prefix.bright_green().bold().to_string(),
        "error" | "failed" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Injectable logger
// ============================================================================

type LogFn = dyn Fn(&str, &str) + Send + Sync;

/// Cloneable log sink handed to the pipeline at construction.
#[derive(Clone)]
pub struct Logger {
    sink: Arc<LogFn>,
    verbose: bool,
}

impl Logger {
    /// Forward to the colored terminal logger.
    pub fn terminal() -> Self {
        Self {
            sink: Arc::new(log),
            verbose: is_verbose(),
        }
    }

    /// Discard everything.
    pub fn silent() -> Self {
        Self::from_fn(|_, _| {})
    }

    /// Wrap an arbitrary sink.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(f),
            verbose: false,
        }
    }

    /// Record `[module] message` lines in memory.
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let logger = Self::from_fn(move |module, message| {
            sink.lock().push(format!("[{module}] {message}"));
        });
        (logger.with_verbose(true), lines)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[inline]
    pub fn log(&self, module: &str, message: &str) {
        (self.sink)(module, message);
    }

    /// Only forwarded in verbose mode.
    #[inline]
    pub fn debug(&self, module: &str, message: &str) {
        if self.verbose {
            (self.sink)(module, message);
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::terminal()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_module_prefix() {
        let (logger, lines) = Logger::capture();
        logger.log("publish", "css/site.css");
        assert_eq!(lines.lock().as_slice(), ["[publish] css/site.css"]);
    }

    #[test]
    fn test_debug_respects_verbose() {
        let (logger, lines) = Logger::capture();
        let quiet = logger.clone().with_verbose(false);
        quiet.debug("scan", "hidden");
        logger.debug("scan", "shown");
        assert_eq!(lines.lock().len(), 1);
        assert!(lines.lock()[0].ends_with("shown"));
    }

    #[test]
    fn test_prefix_contains_module() {
        let prefix = colorize_prefix("fresh", "fresh");
        assert!(prefix.contains("[fresh]"));
    }
}
