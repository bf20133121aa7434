//! Error types and Result aliases for treewatch.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias using treewatch's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for treewatch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The native notification handle could not be allocated.
    #[error("failed to allocate native watcher: {0}")]
    Allocation(#[source] notify::Error),

    /// Failed to register a path with the native notifier.
    #[error("failed to watch path '{}': {source}", path.display())]
    WatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Failed to deregister a path from the native notifier.
    #[error("failed to unwatch path '{}': {source}", path.display())]
    UnwatchFailed {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Only directories can be watched.
    #[error("not a directory: '{}'", path.display())]
    NotADirectory { path: PathBuf },

    /// The watcher has been closed.
    #[error("watcher is closed")]
    Closed,

    /// Glob pattern failed to parse.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The notifier reported a problem while watching.
    #[error("notification stream error: {0}")]
    Stream(#[source] notify::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error was caused by using a closed watcher.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Watcher(WatcherError::Closed))
    }
}

impl WatcherError {
    /// Create a watch-failed error for `path`.
    pub fn watch_failed(path: impl AsRef<Path>, source: notify::Error) -> Self {
        Self::WatchFailed {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an unwatch-failed error for `path`.
    pub fn unwatch_failed(path: impl AsRef<Path>, source: notify::Error) -> Self {
        Self::UnwatchFailed {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create an invalid-pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }
}
