//! File system event types and the mapping from native records.

use std::fmt;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use notify::event::{ModifyKind, RenameMode};
use notify::EventKind;
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::error::{Error, WatcherError};

bitflags! {
    /// Kinds of change carried by an [`Event`].
    ///
    /// More than one bit may be set when the native facility coalesces
    /// several changes into one record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Op: u16 {
        const CREATE = 1 << 0;
        const WRITE  = 1 << 1;
        const REMOVE = 1 << 2;
        const RENAME = 1 << 3;
        const CHMOD  = 1 << 4;
        const ERROR  = 1 << 11;
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("[no events]");
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        Ok(())
    }
}

/// A normalized change notification.
#[derive(Debug)]
pub struct Event {
    /// Kind(s) of change.
    pub op: Op,
    /// Path the event concerns; empty for error events.
    pub path: PathBuf,
    /// Present only when `op` contains [`Op::ERROR`].
    pub error: Option<Error>,
}

impl Event {
    /// Create a change event for `path`.
    pub fn new(op: Op, path: impl Into<PathBuf>) -> Self {
        Self {
            op,
            path: path.into(),
            error: None,
        }
    }

    /// Create an error event.
    #[must_use]
    pub fn error(error: Error) -> Self {
        Self {
            op: Op::ERROR,
            path: PathBuf::new(),
            error: Some(error),
        }
    }

    /// Check whether any of the bits in `op` are set on this event.
    #[must_use]
    pub const fn has(&self, op: Op) -> bool {
        self.op.intersects(op)
    }

    /// Path the event concerns.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Normalize one native record into zero or more events, one per path.
    ///
    /// Records the crate does not surface (access notifications, the
    /// combined two-path rename record) produce nothing.
    #[must_use]
    pub fn from_native(record: notify::Event) -> Vec<Self> {
        let Some(op) = op_for_kind(&record.kind) else {
            return Vec::new();
        };
        record
            .paths
            .into_iter()
            .map(|path| Self::new(op, path))
            .collect()
    }

    /// Wrap a native stream error.
    #[must_use]
    pub fn from_native_error(err: notify::Error) -> Self {
        Self::error(WatcherError::Stream(err).into())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(err) => write!(f, "{}: {err}", self.op),
            None => write!(f, "{}: {}", self.op, self.path.display()),
        }
    }
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Event", 3)?;
        state.serialize_field("op", &self.op.to_string())?;
        state.serialize_field("path", &self.path.to_string_lossy())?;
        state.serialize_field("error", &self.error.as_ref().map(ToString::to_string))?;
        state.end()
    }
}

/// Map a native event kind onto [`Op`] bits.
///
/// The new name of a rename is reported as a creation so that a directory
/// renamed inside the tree is registered again.
///
/// Backends that cannot tell the two halves of a rename apart (FSEvents
/// reports `RenameMode::Any`) only produce [`Op::RENAME`], so there the new
/// name of a renamed directory is not registered until something is created
/// below it.
fn op_for_kind(kind: &EventKind) -> Option<Op> {
    match kind {
        EventKind::Create(_) => Some(Op::CREATE),
        EventKind::Remove(_) => Some(Op::REMOVE),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(Op::CREATE),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
        EventKind::Modify(ModifyKind::Name(_)) => Some(Op::RENAME),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Op::CHMOD),
        EventKind::Modify(_) | EventKind::Any => Some(Op::WRITE),
        EventKind::Access(_) | EventKind::Other => None,
    }
}
