//! Counters for watch activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

/// Statistics for a watcher.
#[derive(Debug, Default)]
pub struct WatchStats {
    pub events_delivered: AtomicU64,
    pub errors_delivered: AtomicU64,
    pub dirs_added: AtomicU64,
    pub dirs_removed: AtomicU64,
    pub add_failures: AtomicU64,
}

impl WatchStats {
    /// Create new stats tracker.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> WatchStatsSnapshot {
        WatchStatsSnapshot {
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            errors_delivered: self.errors_delivered.load(Ordering::Relaxed),
            dirs_added: self.dirs_added.load(Ordering::Relaxed),
            dirs_removed: self.dirs_removed.load(Ordering::Relaxed),
            add_failures: self.add_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of watch stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WatchStatsSnapshot {
    pub events_delivered: u64,
    pub errors_delivered: u64,
    pub dirs_added: u64,
    pub dirs_removed: u64,
    pub add_failures: u64,
}
