// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::types::OutputMode;

/// Latency used when neither the CLI nor the config file sets one.
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(1);

/// Configuration as read from an optional TOML file.
///
/// ```toml
/// [watch]
/// directories = ["src", "assets"]
/// latency = "200ms"
/// exclude = "/\\.git/|~$"
/// subdirs = true
///
/// [report]
/// long = false
/// mode = "group"
///
/// [command]
/// run = ["make", "assets"]
/// dry_run = false
/// ```
///
/// All sections are optional; CLI flags are layered on top before
/// validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub report: ReportSection,

    #[serde(default)]
    pub command: CommandSection,
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    /// Root directories to watch.
    #[serde(default)]
    pub directories: Vec<String>,

    /// Duration string (e.g. `"200ms"`, `"1s"`, `"0"`).
    ///
    /// Used both as the per-path quiet period and as the accumulation
    /// window. `None` means [`DEFAULT_LATENCY`].
    #[serde(default)]
    pub latency: Option<String>,

    /// Regular expression; events on matching paths are ignored.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Watch existing subdirectories and directories created later.
    #[serde(default)]
    pub subdirs: bool,
}

/// `[report]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSection {
    /// Prefix lines with a timestamp and append kinds and sizes.
    #[serde(default)]
    pub long: bool,

    #[serde(default)]
    pub mode: OutputMode,
}

/// `[command]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandSection {
    /// Program and leading arguments; changed paths are appended.
    #[serde(default)]
    pub run: Vec<String>,

    /// Log the command instead of running it.
    #[serde(default)]
    pub dry_run: bool,
}

/// Validated options threaded through every pipeline component.
///
/// Construct via `Options::try_from(RawConfigFile)` (see `validate.rs`) or
/// [`crate::config::loader::resolve_options`].
#[derive(Debug, Clone)]
pub struct Options {
    pub directories: Vec<PathBuf>,
    pub latency: Duration,
    pub exclude: Option<Regex>,
    pub subdirs: bool,
    pub long_format: bool,
    pub mode: OutputMode,
    pub command: Option<Vec<String>>,
    pub dry_run: bool,
}

impl Options {
    /// `latency = 0`: no debounce, no accumulation.
    pub fn is_raw(&self) -> bool {
        self.latency.is_zero()
    }

    pub fn group(&self) -> bool {
        self.mode == OutputMode::Group
    }
}
