//! treewatch
//!
//! Recursive filesystem change monitor. Keeps a set of watched directories in
//! step with the tree below a root and delivers one ordered stream of change
//! events to a callback, optionally filtered by a glob.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::Config;
pub use error::{Error, Result, WatcherError};
pub use watcher::{watch, watch_glob, watch_recursive, watch_recursive_with, Event, Op, Watcher};
