//! File system watching.
//!
//! This module provides:
//! - A watcher that keeps a set of directories registered with notify-rs
//! - A dispatch loop delivering normalized events to a callback
//! - A recursive policy that follows subdirectory creation and removal
//! - Glob filtering of delivered events

mod backend;
mod events;
mod filter;
mod probe;
mod recursive;
mod stats;
#[cfg(test)]
mod testing;
#[allow(clippy::module_inception)]
mod watcher;

use std::path::Path;

use tokio_util::sync::CancellationToken;

pub use backend::{Notifier, NotifierStreams, NotifyBackend};
pub use events::{Event, Op};
pub use filter::{to_slash, validate_pattern, GlobFilter};
pub use probe::{FsProbe, PathProbe};
pub use recursive::{RecursiveOptions, RecursivePolicy};
pub use stats::{WatchStats, WatchStatsSnapshot};
pub use watcher::Watcher;

use crate::Result;

/// Watch a single directory until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or `path` cannot be
/// watched.
pub async fn watch<F>(cancel: CancellationToken, path: impl AsRef<Path>, callback: F) -> Result<()>
where
    F: FnMut(Event),
{
    let watcher = Watcher::new()?;
    watcher.add(path)?;
    watcher.watch(cancel, callback).await
}

/// Watch a directory and all of its subdirectories until `cancel` fires.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or `path` cannot be
/// watched.
pub async fn watch_recursive<F>(
    cancel: CancellationToken,
    path: impl AsRef<Path>,
    callback: F,
) -> Result<()>
where
    F: FnMut(Event),
{
    watch_recursive_with(cancel, path, RecursiveOptions::default(), callback).await
}

/// [`watch_recursive`] with explicit policy options.
///
/// # Errors
///
/// Returns an error if the watcher cannot be created or `path` cannot be
/// watched.
pub async fn watch_recursive_with<F>(
    cancel: CancellationToken,
    path: impl AsRef<Path>,
    options: RecursiveOptions,
    callback: F,
) -> Result<()>
where
    F: FnMut(Event),
{
    let watcher = Watcher::new()?;
    let policy = RecursivePolicy::new(options);
    policy.seed(&watcher, path)?;
    watcher.watch(cancel, policy.wrap(&watcher, callback)).await
}

/// Watch `dir` recursively, delivering only events whose path matches
/// `pattern` relative to `dir`.
///
/// # Errors
///
/// Returns an error before anything is watched if `pattern` is invalid, and
/// otherwise as [`watch_recursive`].
pub async fn watch_glob<F>(
    cancel: CancellationToken,
    dir: impl AsRef<Path>,
    pattern: &str,
    callback: F,
) -> Result<()>
where
    F: FnMut(Event),
{
    let dir = dir.as_ref();
    let filter = GlobFilter::new(dir, pattern)?;
    watch_recursive(cancel, dir, filter.wrap(callback)).await
}
