//! Configuration settings and validation.

use crate::observability::TracingConfig;
use crate::watcher::{validate_pattern, RecursiveOptions};
use crate::{Error, Result};
use std::path::PathBuf;

/// Main configuration for a treewatch run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory to watch.
    pub root: PathBuf,

    /// Follow subdirectories.
    pub recursive: bool,

    /// Only report paths matching this glob, relative to `root`.
    /// Setting a pattern implies `recursive`.
    pub pattern: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,

    /// Print events as JSON lines.
    pub json_events: bool,

    /// Report failed registrations of new directories as error events.
    pub report_add_errors: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: false,
            pattern: None,
            log_level: "info".to_string(),
            log_json: false,
            json_events: false,
            report_add_errors: false,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(Error::config("root path cannot be empty"));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if let Some(pattern) = &self.pattern {
            validate_pattern(pattern)?;
        }

        Ok(())
    }

    /// Whether subdirectories are followed.
    #[must_use]
    pub const fn is_recursive(&self) -> bool {
        self.recursive || self.pattern.is_some()
    }

    /// Logging settings.
    #[must_use]
    pub fn tracing(&self) -> TracingConfig {
        TracingConfig {
            level: self.log_level.clone(),
            json: self.log_json,
        }
    }

    /// Options for the recursive policy.
    #[must_use]
    pub const fn recursive_options(&self) -> RecursiveOptions {
        RecursiveOptions {
            report_add_errors: self.report_add_errors,
        }
    }
}
