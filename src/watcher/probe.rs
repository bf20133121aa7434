//! Path predicates consulted by the recursive policy.

use std::path::Path;

/// Answers whether a path is currently a directory.
pub trait PathProbe: Send + Sync {
    /// Check if `path` is a directory at the instant of the call.
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`PathProbe`] that asks the real filesystem.
///
/// Symlinks are followed, so a link to a directory counts as a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl PathProbe for FsProbe {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
