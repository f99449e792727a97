// src/watch/notifier.rs

//! Adapter between `notify` and the pipeline.
//!
//! The OS watcher calls back on its own thread; every callback is stamped,
//! translated into [`RawEvent`]s (one per path) and pushed into an unbounded
//! channel that the async ingestion loop consumes.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{Result, WatchError};
use crate::types::{EventMask, RawEvent};
use crate::watch::expander::WatchRegistrar;

/// Items delivered by the notifier.
#[derive(Debug)]
pub enum NotifierMessage {
    Event(RawEvent),
    /// An error reported asynchronously by the OS watcher.
    Error(WatchError),
}

/// Registers non-recursive watches on a `notify` watcher.
///
/// Dropping this stops all watching and closes the message channel.
pub struct NotifyRegistrar {
    watcher: RecommendedWatcher,
}

impl std::fmt::Debug for NotifyRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyRegistrar").finish()
    }
}

impl WatchRegistrar for NotifyRegistrar {
    fn add_watch(&mut self, dir: &Path) -> std::result::Result<(), WatchError> {
        self.watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|err| classify_error(dir, err))
    }
}

/// Create the OS watcher. No directory is watched yet; register them through
/// the returned registrar (normally via `WatchExpander`).
pub fn spawn_notifier() -> Result<(NotifyRegistrar, mpsc::UnboundedReceiver<NotifierMessage>)> {
    let (tx, rx) = mpsc::unbounded_channel::<NotifierMessage>();

    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // Record the event time as early as possible.
            let at = Local::now();
            let messages: Vec<NotifierMessage> = match res {
                Ok(event) => translate(event, at)
                    .into_iter()
                    .map(NotifierMessage::Event)
                    .collect(),
                Err(err) => {
                    let path = err.paths.first().cloned().unwrap_or_default();
                    vec![NotifierMessage::Error(classify_error(&path, err))]
                }
            };
            for message in messages {
                if tx.send(message).is_err() {
                    debug!("notifier channel closed; dropping event");
                    return;
                }
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    Ok((NotifyRegistrar { watcher }, rx))
}

/// Translate one `notify` event into per-path raw events.
///
/// Kinds with no counterpart (access, unknown) produce nothing, so a raw
/// event's mask is never empty. Renames carrying both halves are skipped:
/// the backends also report the `From` and `To` halves separately.
pub fn translate(event: Event, at: DateTime<Local>) -> Vec<RawEvent> {
    let kinds = match event.kind {
        EventKind::Create(_) => EventMask::CREATE,
        EventKind::Modify(ModifyKind::Metadata(_)) => EventMask::ATTRIB,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => EventMask::CREATE | EventMask::RENAME,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => EventMask::empty(),
        EventKind::Modify(ModifyKind::Name(_)) => EventMask::RENAME,
        EventKind::Modify(_) => EventMask::MODIFY,
        EventKind::Remove(_) => EventMask::DELETE,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => EventMask::empty(),
    };

    if kinds.is_empty() {
        return Vec::new();
    }

    event
        .paths
        .into_iter()
        .map(|path| RawEvent {
            path,
            timestamp: at,
            kinds,
            metadata: None,
        })
        .collect()
}

/// Map a `notify` error for `path` onto the watch error taxonomy.
pub fn classify_error(path: &Path, err: notify::Error) -> WatchError {
    let message = err.to_string();
    let path: PathBuf = path.to_path_buf();
    match err.kind {
        notify::ErrorKind::MaxFilesWatch => WatchError::LimitReached { path, message },
        notify::ErrorKind::PathNotFound => WatchError::PathGone(path),
        notify::ErrorKind::Io(ref io_err) if io_err.kind() == io::ErrorKind::NotFound => {
            WatchError::PathGone(path)
        }
        notify::ErrorKind::Io(ref io_err) if is_exhaustion(io_err) => {
            WatchError::LimitReached { path, message }
        }
        _ => WatchError::Failed { path, message },
    }
}

#[cfg(unix)]
fn is_exhaustion(err: &io::Error) -> bool {
    // ENFILE, EMFILE, ENOSPC (inotify reports an exhausted watch budget as
    // "no space left on device").
    matches!(err.raw_os_error(), Some(23) | Some(24) | Some(28))
}

#[cfg(not(unix))]
fn is_exhaustion(err: &io::Error) -> bool {
    err.to_string().to_lowercase().contains("too many open files")
}
