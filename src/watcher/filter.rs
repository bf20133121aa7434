//! Glob filtering of events.

use std::path::Path;

use globset::{Glob, GlobBuilder, GlobMatcher};

use super::events::{Event, Op};
use crate::error::WatcherError;
use crate::Result;

/// Callback decorator that drops events whose path does not match a glob
/// anchored at the watch root.
///
/// Matching is done on slash-separated paths. `*` stops at `/`, `**` spans
/// directories. Error events carry no path and always pass.
#[derive(Debug, Clone)]
pub struct GlobFilter {
    pattern: String,
    matcher: GlobMatcher,
}

impl GlobFilter {
    /// Create a filter for `pattern` relative to `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` is not a valid glob.
    pub fn new(root: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        validate_pattern(pattern)?;

        // The root is literal text; only `pattern` carries glob syntax.
        let root = globset::escape(to_slash(root.as_ref()).trim_end_matches('/'));
        let full = format!("{root}/{pattern}");
        let matcher = GlobBuilder::new(&full)
            .literal_separator(true)
            .build()
            .map_err(|e| WatcherError::invalid_pattern(pattern, e.kind()))?
            .compile_matcher();

        Ok(Self {
            pattern: full,
            matcher,
        })
    }

    /// The anchored pattern paths are matched against.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if `path` matches.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.is_match(to_slash(path))
    }

    /// Check if `event` should be forwarded.
    #[must_use]
    pub fn allows(&self, event: &Event) -> bool {
        event.has(Op::ERROR) || self.matches(event.path())
    }

    /// Wrap `next` so only allowed events reach it.
    pub fn wrap<F>(self, mut next: F) -> impl FnMut(Event)
    where
        F: FnMut(Event),
    {
        move |event| {
            if self.allows(&event) {
                next(event);
            } else {
                tracing::trace!(path = %event.path().display(), "Filtered event");
            }
        }
    }
}

/// Check that `pattern` is a syntactically valid glob.
///
/// # Errors
///
/// Returns [`WatcherError::InvalidPattern`] describing the problem.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    Glob::new(pattern)
        .map(drop)
        .map_err(|e| WatcherError::invalid_pattern(pattern, e.kind()).into())
}

/// Render `path` with `/` separators.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let path = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        path.into_owned()
    } else {
        path.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
