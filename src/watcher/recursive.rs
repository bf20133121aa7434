//! Keeps the watch set in step with the directory tree.
//!
//! A notifier only reports changes to the direct entries of a registered
//! directory. The recursive policy sits in front of the caller's callback and
//! registers every directory that appears and deregisters every directory that
//! goes away, so a single root watch covers the whole subtree.
//!
//! Files created inside a new directory before it is registered are not
//! reported. Registration happens synchronously on the Create event, before
//! the next record is read, which keeps that window small but nonzero.

use std::path::Path;

use walkdir::WalkDir;

use super::events::{Event, Op};
use super::stats::WatchStats;
use super::watcher::Watcher;
use crate::Result;

/// Recursive policy options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecursiveOptions {
    /// Deliver a failed registration of a new directory to the callback as an
    /// error event. When off the failure is only logged and counted.
    pub report_add_errors: bool,
}

/// Callback decorator that registers new directories and drops removed ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursivePolicy {
    options: RecursiveOptions,
}

impl RecursivePolicy {
    /// Create a policy with the given options.
    #[must_use]
    pub const fn new(options: RecursiveOptions) -> Self {
        Self { options }
    }

    /// Watch `root` and every directory already below it.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` itself cannot be watched. Failures below the
    /// root are logged and counted.
    pub fn seed(&self, watcher: &Watcher, root: impl AsRef<Path>) -> Result<()> {
        let root = root.as_ref();
        watcher.add(root)?;
        let _ = self.register_below(watcher, root);
        Ok(())
    }

    /// Apply the policy to `event` and return any error events to deliver
    /// after it.
    pub fn apply(&self, watcher: &Watcher, event: &Event) -> Vec<Event> {
        let mut failures = Vec::new();
        let path = event.path();

        if event.has(Op::CREATE) && watcher.probe().is_dir(path) {
            match watcher.register(path) {
                Ok(()) => failures.extend(self.register_below(watcher, path)),
                Err(e) => failures.extend(self.add_failed(watcher, path, e)),
            }
        }

        if event.has(Op::REMOVE | Op::RENAME) && !path.as_os_str().is_empty() {
            for gone in watcher.watched_under(path) {
                if let Err(e) = watcher.remove(&gone) {
                    tracing::debug!(path = %gone.display(), "Failed to drop watch: {}", e);
                }
            }
        }

        failures
    }

    /// Wrap `next` so every event passes through [`RecursivePolicy::apply`]
    /// first.
    pub fn wrap<'a, F>(self, watcher: &'a Watcher, mut next: F) -> impl FnMut(Event) + 'a
    where
        F: FnMut(Event) + 'a,
    {
        move |event| {
            let failures = self.apply(watcher, &event);
            next(event);
            for failure in failures {
                next(failure);
            }
        }
    }

    /// Register directories strictly below `dir`.
    fn register_below(&self, watcher: &Watcher, dir: &Path) -> Vec<Event> {
        let mut failures = Vec::new();
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(dir = %dir.display(), "Skipping unreadable entry: {}", e);
                    None
                }
            });

        for entry in entries.filter(|e| e.file_type().is_dir()) {
            if let Err(e) = watcher.register(entry.path()) {
                failures.extend(self.add_failed(watcher, entry.path(), e));
            }
        }
        failures
    }

    fn add_failed(&self, watcher: &Watcher, path: &Path, err: crate::Error) -> Option<Event> {
        WatchStats::incr(&watcher.counters().add_failures);
        tracing::warn!(path = %path.display(), "Failed to watch new directory: {}", err);
        self.options.report_add_errors.then(|| Event::error(err))
    }
}
