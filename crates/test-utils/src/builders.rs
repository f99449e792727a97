#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use settlewatch::config::{Options, RawConfigFile};
use settlewatch::types::{EventMask, FileMeta, OutputMode, RawEvent, SettledEvent};

/// Builder for `Options` to simplify test setup.
///
/// Goes through the same validation as a real config file, so invalid
/// combinations fail here rather than deep inside a test.
pub struct OptionsBuilder {
    config: RawConfigFile,
}

impl OptionsBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.watch.directories.push("/watched".to_string());
        Self { config }
    }

    /// Replace the watched directories.
    pub fn directories(mut self, dirs: &[&str]) -> Self {
        self.config.watch.directories = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.config.watch.latency = Some(format!("{}ms", latency.as_millis()));
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.watch.exclude = Some(pattern.to_string());
        self
    }

    pub fn subdirs(mut self, val: bool) -> Self {
        self.config.watch.subdirs = val;
        self
    }

    pub fn long(mut self, val: bool) -> Self {
        self.config.report.long = val;
        self
    }

    pub fn group(mut self) -> Self {
        self.config.report.mode = OutputMode::Group;
        self
    }

    pub fn command(mut self, cmd: &[&str]) -> Self {
        self.config.command.run = cmd.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn dry_run(mut self, val: bool) -> Self {
        self.config.command.dry_run = val;
        self
    }

    pub fn build(self) -> Options {
        Options::try_from(self.config).expect("Failed to build valid options from builder")
    }
}

impl Default for OptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A raw event for `path`, stamped now, without metadata.
pub fn raw(path: &str, kinds: EventMask) -> RawEvent {
    RawEvent::new(path, kinds)
}

/// A raw event carrying file metadata.
pub fn raw_file(path: &str, kinds: EventMask, size: u64) -> RawEvent {
    RawEvent::new(path, kinds).with_metadata(Some(FileMeta {
        size,
        is_dir: false,
    }))
}

/// A raw event for a directory.
pub fn raw_dir(path: &str, kinds: EventMask) -> RawEvent {
    RawEvent::new(path, kinds).with_metadata(Some(FileMeta {
        size: 4096,
        is_dir: true,
    }))
}

/// A settled MODIFY event for `path`.
pub fn settled(path: &str) -> SettledEvent {
    SettledEvent::from(RawEvent::new(path, EventMask::MODIFY))
}

pub fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}
