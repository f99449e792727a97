// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use regex::Regex;

use crate::config::model::{Options, RawConfigFile, DEFAULT_LATENCY};
use crate::errors::{Result, SettleError};

impl TryFrom<RawConfigFile> for Options {
    type Error = SettleError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_directories(&raw)?;

        let latency = match raw.watch.latency.as_deref() {
            Some(s) => parse_duration(s).map_err(|e| {
                SettleError::ConfigError(format!("[watch].latency: {e}"))
            })?,
            None => DEFAULT_LATENCY,
        };

        let exclude = compile_exclude(raw.watch.exclude.as_deref())?;
        let command = validate_command(raw.command.run)?;

        Ok(Options {
            directories: raw.watch.directories.into_iter().map(PathBuf::from).collect(),
            latency,
            exclude,
            subdirs: raw.watch.subdirs,
            long_format: raw.report.long,
            mode: raw.report.mode,
            command,
            dry_run: raw.command.dry_run,
        })
    }
}

fn ensure_has_directories(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.directories.is_empty() {
        return Err(SettleError::ConfigError(
            "at least one directory to watch is required".to_string(),
        ));
    }
    if let Some(empty) = cfg.watch.directories.iter().find(|d| d.trim().is_empty()) {
        return Err(SettleError::ConfigError(format!(
            "directory names must not be empty (got {:?})",
            empty
        )));
    }
    Ok(())
}

fn compile_exclude(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        // An empty pattern would match every path.
        None | Some("") => Ok(None),
        Some(p) => Ok(Some(Regex::new(p)?)),
    }
}

fn validate_command(run: Vec<String>) -> Result<Option<Vec<String>>> {
    match run.first() {
        None => Ok(None),
        Some(program) if program.trim().is_empty() => Err(SettleError::ConfigError(
            "command program must not be empty".to_string(),
        )),
        Some(_) => Ok(Some(run)),
    }
}

/// Longest accepted duration, about 292 years. Deadlines are
/// `Instant::now() + latency`, which must not overflow.
pub const MAX_DURATION: Duration = Duration::from_nanos(i64::MAX as u64);

/// Parse a duration such as `"250ms"`, `"1s"`, `"2m"` or `"1h"`.
///
/// A bare `"0"` is accepted and disables debouncing and accumulation.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let duration = match unit.as_str() {
        "ms" => Some(Duration::from_millis(value)),
        "s" => Some(Duration::from_secs(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        "h" => value.checked_mul(60 * 60).map(Duration::from_secs),
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    match duration {
        Some(d) if d <= MAX_DURATION => Ok(d),
        _ => Err(format!("duration too large: '{}'", s)),
    }
}