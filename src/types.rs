// src/types.rs

//! Event and batch types shared by every pipeline stage.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bitflags::bitflags;
use chrono::{DateTime, Local};
use serde::Deserialize;

bitflags! {
    /// Kinds of change seen on a path. Never empty on a [`RawEvent`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u8 {
        const CREATE = 1 << 0;
        const MODIFY = 1 << 1;
        const RENAME = 1 << 2;
        const DELETE = 1 << 3;
        const ATTRIB = 1 << 4;
    }
}

impl EventMask {
    /// Only creations and modifications produce reports; the other kinds are
    /// carried along for long-format output when mixed into a burst.
    pub fn is_reportable(self) -> bool {
        self.intersects(EventMask::CREATE | EventMask::MODIFY)
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (EventMask::CREATE, "CREATE"),
            (EventMask::MODIFY, "MODIFY"),
            (EventMask::DELETE, "DELETE"),
            (EventMask::RENAME, "RENAME"),
            (EventMask::ATTRIB, "ATTRIB"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        f.write_str(&parts.join("|"))
    }
}

/// What `stat` told us about a path when its event was ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMeta {
    pub size: u64,
    pub is_dir: bool,
}

/// One normalized notification from the upstream notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub timestamp: DateTime<Local>,
    pub kinds: EventMask,
    pub metadata: Option<FileMeta>,
}

impl RawEvent {
    /// Event stamped with the current local time and no metadata.
    pub fn new(path: impl Into<PathBuf>, kinds: EventMask) -> Self {
        Self {
            path: path.into(),
            timestamp: Local::now(),
            kinds,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Option<FileMeta>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A path that has gone quiet for at least one latency period.
///
/// `kinds` is the union of every kind seen during the burst; `timestamp` and
/// `metadata` come from the most recent raw event.
#[derive(Debug, Clone, PartialEq)]
pub struct SettledEvent {
    pub path: PathBuf,
    pub timestamp: DateTime<Local>,
    pub kinds: EventMask,
    pub metadata: Option<FileMeta>,
}

impl SettledEvent {
    /// Fold a later event for the same path into this one.
    pub fn merge(&mut self, later: RawEvent) {
        self.absorb(later.into());
    }

    pub(crate) fn absorb(&mut self, later: SettledEvent) {
        debug_assert_eq!(self.path, later.path);
        self.kinds |= later.kinds;
        self.timestamp = later.timestamp;
        if later.metadata.is_some() {
            self.metadata = later.metadata;
        }
    }
}

impl From<RawEvent> for SettledEvent {
    fn from(event: RawEvent) -> Self {
        Self {
            path: event.path,
            timestamp: event.timestamp,
            kinds: event.kinds,
            metadata: event.metadata,
        }
    }
}

/// Paths reported together because they settled inside one window.
///
/// Entries are unique by path and kept in first-arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub entries: Vec<SettledEvent>,
    pub flushed_at: DateTime<Local>,
}

impl Batch {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A settled event in grouping mode, flagged when it closes its batch.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedEvent {
    pub event: SettledEvent,
    pub last_in_batch: bool,
}

/// How settled events are turned into report lines.
///
/// - `Batch`: buffer a whole window, then print one line (default).
/// - `Group`: print each path as soon as the next one arrives and terminate
///   the line when the window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Batch,
    Group,
}

impl Default for OutputMode {
    fn default() -> Self {
        OutputMode::Batch
    }
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Ok(OutputMode::Batch),
            "group" => Ok(OutputMode::Group),
            other => Err(format!(
                "invalid report mode: {other} (expected \"batch\" or \"group\")"
            )),
        }
    }
}
