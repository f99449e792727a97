// src/watch/expander.rs

//! Growing the watch set while the pipeline runs.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, SettleError, WatchError};
use crate::types::{EventMask, RawEvent};

/// Registration side of the upstream notifier.
///
/// Production code wraps a `notify` watcher; tests record the calls.
pub trait WatchRegistrar: Send {
    /// Start watching `dir` (not recursively).
    fn add_watch(&mut self, dir: &Path) -> std::result::Result<(), WatchError>;
}

/// What [`WatchExpander::observe`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Not a directory creation, or subdirectory tracking is off.
    NotApplicable,
    /// A watch was registered for the new directory.
    Added(PathBuf),
    /// The directory is already watched.
    AlreadyWatched,
    /// The path could not be inspected (it vanished) or the notifier refused
    /// it for a non-fatal reason.
    Skipped,
    /// Shutdown has begun; no more watches are registered.
    Closed,
}

/// Single owner of the set of watched directories.
///
/// Only this type registers watches, so the set never changes behind its
/// back. Watches are never removed before shutdown.
pub struct WatchExpander<R: WatchRegistrar> {
    registrar: R,
    watched: HashSet<PathBuf>,
    subdirs: bool,
    closed: bool,
}

impl<R: WatchRegistrar> std::fmt::Debug for WatchExpander<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchExpander")
            .field("watched", &self.watched.len())
            .field("subdirs", &self.subdirs)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<R: WatchRegistrar> WatchExpander<R> {
    pub fn new(registrar: R, subdirs: bool) -> Self {
        Self {
            registrar,
            watched: HashSet::new(),
            subdirs,
            closed: false,
        }
    }

    /// Register the initial directories.
    ///
    /// Non-fatal failures are logged and the directory is skipped; a watch
    /// limit aborts. Fails if none of the directories could be watched.
    pub fn watch_initial(&mut self, dirs: &[PathBuf]) -> Result<()> {
        for dir in dirs {
            debug!(?dir, "watching");
            match self.register(dir) {
                Ok(_) => {}
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => warn!(error = %err, "could not watch directory"),
            }
        }

        if self.watched.is_empty() {
            return Err(SettleError::ConfigError(format!(
                "none of the directories could be watched: {:?}",
                dirs
            )));
        }
        info!(directories = self.watched.len(), "all directory watches established");
        Ok(())
    }

    /// Possibly add a watch for a newly created directory.
    ///
    /// Relies on the event's metadata to know whether the path is a
    /// directory; an event without metadata means the path vanished before
    /// it could be inspected, which is expected under churn.
    pub fn observe(&mut self, event: &RawEvent) -> Result<Expansion> {
        if !self.subdirs || !event.kinds.contains(EventMask::CREATE) {
            return Ok(Expansion::NotApplicable);
        }
        let meta = match event.metadata {
            Some(meta) => meta,
            None => {
                debug!(path = ?event.path, "created path vanished before inspection; not expanding");
                return Ok(Expansion::Skipped);
            }
        };
        if !meta.is_dir {
            return Ok(Expansion::NotApplicable);
        }
        if self.closed {
            debug!(path = ?event.path, "shutdown in progress; not adding watch");
            return Ok(Expansion::Closed);
        }
        if self.watched.contains(&event.path) {
            return Ok(Expansion::AlreadyWatched);
        }

        match self.register(&event.path) {
            Ok(true) => {
                debug!(path = ?event.path, "adding watch for new directory");
                Ok(Expansion::Added(event.path.clone()))
            }
            Ok(false) => Ok(Expansion::AlreadyWatched),
            Err(err) if err.is_fatal() => Err(err.into()),
            Err(WatchError::PathGone(path)) => {
                debug!(?path, "new directory vanished before it could be watched");
                Ok(Expansion::Skipped)
            }
            Err(err) => {
                warn!(error = %err, "could not watch new directory");
                Ok(Expansion::Skipped)
            }
        }
    }

    /// Stop registering watches. Called when shutdown begins.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_watched(&self, dir: &Path) -> bool {
        self.watched.contains(dir)
    }

    pub fn watched_count(&self) -> usize {
        self.watched.len()
    }

    /// Returns `Ok(false)` if `dir` was already in the set.
    fn register(&mut self, dir: &Path) -> std::result::Result<bool, WatchError> {
        if self.watched.contains(dir) {
            return Ok(false);
        }
        self.registrar.add_watch(dir)?;
        self.watched.insert(dir.to_path_buf());
        Ok(true)
    }
}
