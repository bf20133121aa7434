//! Watch-set manager and event dispatch loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use super::backend::{Notifier, NotifierStreams, NotifyBackend};
use super::events::Event;
use super::probe::{FsProbe, PathProbe};
use super::stats::{WatchStats, WatchStatsSnapshot};
use crate::error::WatcherError;
use crate::Result;

/// Why a dispatch loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Cancelled,
    ChangesClosed,
    ErrorsClosed,
}

/// File system watcher.
///
/// Owns one native notifier. The watch set is whatever the notifier has
/// registered, so a directory the kernel dropped on deletion leaves both
/// [`Watcher::has`] and [`Watcher::list`] at once.
/// All methods take `&self`, so the recursive policy can register new
/// directories from inside the callback of a running [`Watcher::watch`].
pub struct Watcher {
    notifier: Mutex<Option<Box<dyn Notifier>>>,
    streams: tokio::sync::Mutex<NotifierStreams>,
    probe: Arc<dyn PathProbe>,
    stats: Arc<WatchStats>,
}

impl Watcher {
    /// Create a watcher on the platform's native notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the native handle cannot be allocated.
    pub fn new() -> Result<Self> {
        let (backend, streams) = NotifyBackend::new()?;
        Ok(Self::with_parts(
            Box::new(backend),
            streams,
            Arc::new(FsProbe),
        ))
    }

    /// Assemble a watcher from an explicit notifier, its streams, and a
    /// directory probe.
    #[must_use]
    pub fn with_parts(
        notifier: Box<dyn Notifier>,
        streams: NotifierStreams,
        probe: Arc<dyn PathProbe>,
    ) -> Self {
        Self {
            notifier: Mutex::new(Some(notifier)),
            streams: tokio::sync::Mutex::new(streams),
            probe,
            stats: WatchStats::new(),
        }
    }

    /// Add a directory to watch.
    ///
    /// Adding a path that is already watched is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher is closed, `path` is not a directory,
    /// or the notifier refuses the registration.
    pub fn add(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if self.is_closed() {
            return Err(WatcherError::Closed.into());
        }
        if !self.probe.is_dir(path) {
            return Err(WatcherError::NotADirectory {
                path: path.to_path_buf(),
            }
            .into());
        }
        self.register(path)
    }

    /// Register `path` without checking that it is a directory.
    pub(crate) fn register(&self, path: &Path) -> Result<()> {
        let mut notifier = self.notifier.lock();
        let native = notifier.as_mut().ok_or(WatcherError::Closed)?;

        let fresh = !native.watch_list().iter().any(|p| p == path);
        native
            .watch(path)
            .map_err(|e| WatcherError::watch_failed(path, e))?;

        if fresh {
            WatchStats::incr(&self.stats.dirs_added);
            tracing::debug!(path = %path.display(), "Watching directory");
        }
        Ok(())
    }

    /// Stop watching a directory.
    ///
    /// Removing a path that is not watched is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher is closed or the notifier still
    /// holds the path after failing to deregister it.
    pub fn remove(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut notifier = self.notifier.lock();
        let native = notifier.as_mut().ok_or(WatcherError::Closed)?;

        let held = native.watch_list().iter().any(|p| p == path);
        if let Err(e) = native.unwatch(path) {
            if native.watch_list().iter().any(|p| p == path) {
                return Err(WatcherError::unwatch_failed(path, e).into());
            }
            tracing::trace!(path = %path.display(), "Path was not registered: {}", e);
        }

        if held {
            WatchStats::incr(&self.stats.dirs_removed);
            tracing::debug!(path = %path.display(), "Stopped watching directory");
        }
        Ok(())
    }

    /// Check if `path` is watched. Exact path comparison, no normalization.
    #[must_use]
    pub fn has(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        self.notifier
            .lock()
            .as_ref()
            .is_some_and(|native| native.watch_list().iter().any(|p| p == path))
    }

    /// Watched paths equal to or below `root`.
    pub(crate) fn watched_under(&self, root: &Path) -> Vec<PathBuf> {
        let notifier = self.notifier.lock();
        let Some(native) = notifier.as_ref() else {
            return Vec::new();
        };
        native
            .watch_list()
            .into_iter()
            .filter(|p| p.starts_with(root))
            .collect()
    }

    /// Get the directories registered with the notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher is closed.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let notifier = self.notifier.lock();
        let native = notifier.as_ref().ok_or(WatcherError::Closed)?;
        Ok(native.watch_list())
    }

    /// Release the native notifier.
    ///
    /// A running [`Watcher::watch`] drains what was already delivered and
    /// then returns `Ok`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher was already closed.
    pub fn close(&self) -> Result<()> {
        let native = self.notifier.lock().take().ok_or(WatcherError::Closed)?;
        drop(native);
        tracing::info!("Watcher closed");
        Ok(())
    }

    /// Deliver events to `callback` until cancelled or the notifier closes.
    ///
    /// Callbacks run one at a time, in the order the notifier produced the
    /// records. A second call waits until the first loop has stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if the watcher is closed before the loop starts.
    pub async fn watch<F>(&self, cancel: CancellationToken, mut callback: F) -> Result<()>
    where
        F: FnMut(Event),
    {
        if self.is_closed() {
            return Err(WatcherError::Closed.into());
        }

        let mut guard = self.streams.lock().await;
        let streams = &mut *guard;
        tracing::info!(dirs = self.watched_count(), "Watch loop started");

        // Cancellation is polled first, then changes, so a closed change
        // stream is only seen once every buffered record has been delivered.
        let reason = loop {
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            tokio::select! {
                biased;
                () = cancel.cancelled() => break StopReason::Cancelled,
                record = streams.events.recv() => {
                    let Some(record) = record else {
                        break StopReason::ChangesClosed;
                    };
                    for event in Event::from_native(record) {
                        if cancel.is_cancelled() {
                            break;
                        }
                        WatchStats::incr(&self.stats.events_delivered);
                        callback(event);
                    }
                }
                err = streams.errors.recv() => {
                    let Some(err) = err else {
                        break StopReason::ErrorsClosed;
                    };
                    self.deliver_error(err, &mut callback);
                }
            }
        };

        if reason == StopReason::ChangesClosed {
            while let Ok(err) = streams.errors.try_recv() {
                if cancel.is_cancelled() {
                    break;
                }
                self.deliver_error(err, &mut callback);
            }
        }

        tracing::info!(reason = ?reason, "Watch loop stopped");
        Ok(())
    }

    fn deliver_error<F: FnMut(Event)>(&self, err: notify::Error, callback: &mut F) {
        WatchStats::incr(&self.stats.errors_delivered);
        callback(Event::from_native_error(err));
    }

    /// Get snapshot of watch statistics.
    #[must_use]
    pub fn stats(&self) -> WatchStatsSnapshot {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &WatchStats {
        &self.stats
    }

    pub(crate) fn probe(&self) -> &dyn PathProbe {
        self.probe.as_ref()
    }

    fn watched_count(&self) -> usize {
        self.notifier
            .lock()
            .as_ref()
            .map_or(0, |native| native.watch_list().len())
    }

    fn is_closed(&self) -> bool {
        self.notifier.lock().is_none()
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let watched = self.list().unwrap_or_default();
        f.debug_struct("Watcher")
            .field("watched", &watched)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
