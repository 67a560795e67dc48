//! `[publish]` and `[tools]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [publish]
//! concurrency = 8              # Artifacts in flight at once
//! max_age = 31556926           # Cache-Control max-age, seconds
//! max_retries = 3              # Retries for transport errors and 5xx
//! initial_backoff_ms = 200
//! max_backoff_ms = 5000
//! multiplier = 2.0
//!
//! [tools]
//! png = ["optipng", "-quiet"]  # Input path appended
//! jpeg = ["jpegtran", "-copy", "none", "-optimize", "-outfile", "$INPUT", "$INPUT"]
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::publish::{ONE_YEAR, RetryPolicy};
use crate::transform::Tools;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    pub concurrency: usize,
    pub max_age: u64,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub multiplier: f64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            concurrency: 8,
            max_age: ONE_YEAR,
            max_retries: retry.max_retries,
            initial_backoff_ms: duration_millis(retry.initial_backoff),
            max_backoff_ms: duration_millis(retry.max_backoff),
            multiplier: retry.multiplier,
        }
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PublishConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.multiplier,
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.concurrency == 0 {
            diag.error_with_hint(
                "publish.concurrency",
                "must be at least 1",
                "use 1 for serial uploads",
            );
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            diag.error("publish.multiplier", "must be a number >= 1.0");
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            diag.error(
                "publish.initial_backoff_ms",
                format!(
                    "{} exceeds publish.max_backoff_ms ({})",
                    self.initial_backoff_ms, self.max_backoff_ms
                ),
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub png: Vec<String>,
    pub jpeg: Vec<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let Tools { png, jpeg } = Tools::default();
        Self { png, jpeg }
    }
}

impl ToolsConfig {
    pub fn tools(&self) -> Tools {
        Tools {
            png: self.png.clone(),
            jpeg: self.jpeg.clone(),
        }
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (field, command) in [("tools.png", &self.png), ("tools.jpeg", &self.jpeg)] {
            if command.first().is_some_and(|program| program.trim().is_empty()) {
                diag.error(field, "program name must not be empty");
            }
        }
    }
}
