//! In-memory notifier and probe for exercising the watcher without a real
//! filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::EventKind;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::backend::{Notifier, NotifierStreams};
use super::probe::PathProbe;
use super::watcher::Watcher;

#[derive(Default)]
struct Shared {
    dirs: Vec<PathBuf>,
    registered: Vec<PathBuf>,
    refused: Vec<PathBuf>,
    // The notifier's own ends of the streams. Each stream closes once both
    // this end and the feed's end are gone.
    events_tx: Option<mpsc::UnboundedSender<notify::Event>>,
    errors_tx: Option<mpsc::UnboundedSender<notify::Error>>,
}

struct FakeNotifier {
    shared: Arc<Mutex<Shared>>,
}

impl Drop for FakeNotifier {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        shared.events_tx = None;
        shared.errors_tx = None;
    }
}

impl Notifier for FakeNotifier {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        let mut shared = self.shared.lock();
        if shared.refused.iter().any(|p| p == path) {
            return Err(notify::Error::generic("permission denied").add_path(path.to_path_buf()));
        }
        if !shared.registered.iter().any(|p| p == path) {
            shared.registered.push(path.to_path_buf());
        }
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        let mut shared = self.shared.lock();
        let before = shared.registered.len();
        shared.registered.retain(|p| p != path);
        if shared.registered.len() == before {
            return Err(notify::Error::watch_not_found().add_path(path.to_path_buf()));
        }
        Ok(())
    }

    fn watch_list(&self) -> Vec<PathBuf> {
        self.shared.lock().registered.clone()
    }
}

struct FakeProbe {
    shared: Arc<Mutex<Shared>>,
}

impl PathProbe for FakeProbe {
    fn is_dir(&self, path: &Path) -> bool {
        self.shared.lock().dirs.iter().any(|p| p == path)
    }
}

/// Test-side handle: feeds records and mutates the fake filesystem.
pub struct Feed {
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<notify::Event>,
    errors: Option<mpsc::UnboundedSender<notify::Error>>,
}

impl Feed {
    pub fn send(&self, event: notify::Event) {
        let _ = self.events.send(event);
    }

    pub fn send_error(&self, err: notify::Error) {
        if let Some(errors) = &self.errors {
            let _ = errors.send(err);
        }
    }

    /// Make `path` a directory.
    pub fn mkdir(&self, path: &str) {
        self.shared.lock().dirs.push(PathBuf::from(path));
    }

    /// Make `path` stop being a directory.
    pub fn rmdir(&self, path: &str) {
        self.shared.lock().dirs.retain(|p| p != Path::new(path));
    }

    /// Make the notifier refuse to register `path`.
    pub fn refuse(&self, path: &str) {
        self.shared.lock().refused.push(PathBuf::from(path));
    }

    /// Drop `path` from the notifier behind the watcher's back.
    pub fn forget(&self, path: &str) {
        self.shared.lock().registered.retain(|p| p != Path::new(path));
    }

    /// Stop producing: once buffered records are read, both streams end.
    pub fn close(self) {
        let mut shared = self.shared.lock();
        shared.events_tx = None;
        shared.errors_tx = None;
    }

    /// End the error stream only; change records keep flowing.
    pub fn close_errors(&mut self) {
        self.errors = None;
        self.shared.lock().errors_tx = None;
    }
}

/// Build a watcher on a fake notifier where `dirs` are directories.
pub fn fake_watcher(dirs: &[&str]) -> (Watcher, Feed) {
    let (events_tx, events) = mpsc::unbounded_channel();
    let (errors_tx, errors) = mpsc::unbounded_channel();
    let shared = Arc::new(Mutex::new(Shared {
        dirs: dirs.iter().map(PathBuf::from).collect(),
        events_tx: Some(events_tx.clone()),
        errors_tx: Some(errors_tx.clone()),
        ..Shared::default()
    }));

    let notifier = FakeNotifier {
        shared: Arc::clone(&shared),
    };
    let probe = FakeProbe {
        shared: Arc::clone(&shared),
    };
    let watcher = Watcher::with_parts(
        Box::new(notifier),
        NotifierStreams { events, errors },
        Arc::new(probe),
    );

    (
        watcher,
        Feed {
            shared,
            events: events_tx,
            errors: Some(errors_tx),
        },
    )
}

fn record(kind: EventKind, path: &str) -> notify::Event {
    notify::Event::new(kind).add_path(PathBuf::from(path))
}

pub fn create(path: &str) -> notify::Event {
    record(EventKind::Create(CreateKind::Any), path)
}

pub fn remove(path: &str) -> notify::Event {
    record(EventKind::Remove(RemoveKind::Any), path)
}

pub fn rename_from(path: &str) -> notify::Event {
    record(EventKind::Modify(ModifyKind::Name(RenameMode::From)), path)
}
