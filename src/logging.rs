// src/logging.rs

//! Logging setup for `settlewatch` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `--debug`
//! 3. `SETTLEWATCH_LOG` environment variable (e.g. "info", "debug")
//! 4. default to `warn`, so transient per-event problems stay quiet
//!
//! Logs are sent to STDERR; stdout carries the change reports.

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup. `timestamps = false` mirrors `--nostamp`.
pub fn init_logging(cli_level: Option<LogLevel>, debug: bool, timestamps: bool) -> Result<()> {
    let level = match (cli_level, debug) {
        (Some(lvl), _) => level_from_log_level(lvl),
        (None, true) => tracing::Level::DEBUG,
        (None, false) => std::env::var("SETTLEWATCH_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::WARN),
    };

    let builder = fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
