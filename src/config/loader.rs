// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{Options, RawConfigFile};
use crate::errors::Result;
use crate::types::OutputMode;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; see [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it into [`Options`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Options> {
    let raw_config = load_from_path(&path)?;
    Options::try_from(raw_config)
}

/// Build the effective options for a run.
///
/// - Reads `--config` if given, otherwise starts from defaults.
/// - Layers command-line values on top (flags can only switch features on).
/// - Validates the result.
pub fn resolve_options(args: &CliArgs) -> Result<Options> {
    let raw = match args.config {
        Some(ref path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };
    Options::try_from(apply_cli_overrides(raw, args))
}

/// Merge CLI arguments into a raw config, before validation.
pub fn apply_cli_overrides(mut raw: RawConfigFile, args: &CliArgs) -> RawConfigFile {
    if !args.directories.is_empty() {
        raw.watch.directories = args.directories.clone();
    }
    if let Some(ref latency) = args.latency {
        raw.watch.latency = Some(latency.clone());
    }
    if let Some(ref exclude) = args.exclude {
        raw.watch.exclude = Some(exclude.clone());
    }
    raw.watch.subdirs |= args.subdirs;
    raw.report.long |= args.long;
    if args.group {
        raw.report.mode = OutputMode::Group;
    }
    if !args.command.is_empty() {
        raw.command.run = args.command.clone();
    }
    raw.command.dry_run |= args.dry_run;
    raw
}
