// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `settlewatch`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "settlewatch",
    version,
    about = "Report files once they stop changing, optionally running a command on each batch.",
    long_about = None
)]
pub struct CliArgs {
    /// Directories to watch.
    ///
    /// Replaces `[watch].directories` from the config file when given.
    #[arg(value_name = "DIR")]
    pub directories: Vec<String>,

    /// Optional config file (TOML). Command-line flags override its values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// How long a file must be quiet before it is reported, and how long to
    /// keep accumulating other files into the same report (e.g. `200ms`,
    /// `1s`). `0` reports every event immediately. Default: `1s`.
    #[arg(long, value_name = "DURATION")]
    pub latency: Option<String>,

    /// Regular expression of paths to ignore.
    #[arg(long, value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Watch subdirectories too, including ones created later.
    #[arg(long)]
    pub subdirs: bool,

    /// Long format: timestamp, event kinds and file size.
    #[arg(long)]
    pub long: bool,

    /// Stream paths as they settle and end the line when the batch closes.
    #[arg(long)]
    pub group: bool,

    /// Log the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    pub check: bool,

    /// No datetime stamp on log output.
    #[arg(long)]
    pub nostamp: bool,

    /// Shorthand for `--log-level debug`.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SETTLEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run for each batch; the changed paths are appended.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
