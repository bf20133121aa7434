//! Native notifier contract and the notify-rs implementation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::WatcherError;
use crate::Result;

/// Registration surface of a platform change-notification facility.
///
/// Each registered directory reports changes to its direct entries only.
pub trait Notifier: Send {
    /// Start watching `path`.
    ///
    /// # Errors
    ///
    /// Returns the native error if the path cannot be registered.
    fn watch(&mut self, path: &Path) -> notify::Result<()>;

    /// Stop watching `path`.
    ///
    /// # Errors
    ///
    /// Returns the native error if the path is not registered or cannot be
    /// deregistered.
    fn unwatch(&mut self, path: &Path) -> notify::Result<()>;

    /// Paths currently registered, as the notifier sees them.
    fn watch_list(&self) -> Vec<PathBuf>;
}

/// Output side of a notifier: change records and errors.
///
/// Both streams close once the notifier is dropped.
#[derive(Debug)]
pub struct NotifierStreams {
    pub events: mpsc::UnboundedReceiver<notify::Event>,
    pub errors: mpsc::UnboundedReceiver<notify::Error>,
}

/// [`Notifier`] backed by the platform's recommended notify watcher.
pub struct NotifyBackend {
    inner: RecommendedWatcher,
    registered: Arc<Mutex<Vec<PathBuf>>>,
}

impl NotifyBackend {
    /// Allocate the native watcher and its output streams.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform resource cannot be allocated.
    pub fn new() -> Result<(Self, NotifierStreams)> {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (errors_tx, errors) = mpsc::unbounded_channel();
        let registered = Arc::new(Mutex::new(Vec::new()));
        let registered_clone = Arc::clone(&registered);

        let inner = notify::recommended_watcher(
            move |result: std::result::Result<notify::Event, notify::Error>| match result {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Remove(_)) {
                        // The kernel drops a watch whose directory is deleted
                        forget_removed(&registered_clone, &event.paths);
                    }
                    let _ = events_tx.send(event);
                }
                Err(e) => {
                    tracing::debug!("Native watch error: {:?}", e);
                    let _ = errors_tx.send(e);
                }
            },
        )
        .map_err(WatcherError::Allocation)?;

        Ok((Self { inner, registered }, NotifierStreams { events, errors }))
    }
}

impl Notifier for NotifyBackend {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        self.inner.watch(path, RecursiveMode::NonRecursive)?;
        let mut registered = self.registered.lock();
        if !registered.iter().any(|p| p == path) {
            registered.push(path.to_path_buf());
        }
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        let result = self.inner.unwatch(path);
        let gone = match &result {
            Ok(()) => true,
            Err(e) => matches!(e.kind, notify::ErrorKind::WatchNotFound),
        };
        if gone {
            self.registered.lock().retain(|p| p != path);
        }
        result
    }

    fn watch_list(&self) -> Vec<PathBuf> {
        self.registered.lock().clone()
    }
}

fn forget_removed(registered: &Mutex<Vec<PathBuf>>, paths: &[PathBuf]) {
    let mut registered = registered.lock();
    registered.retain(|p| !paths.contains(p));
}
