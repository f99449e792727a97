// src/config/mod.rs

//! Configuration loading and validation for settlewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the validated [`Options`]
//!   (`model.rs`).
//! - Load a config file from disk and layer CLI flags on top (`loader.rs`).
//! - Validate latency, exclusion pattern and command (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_options};
pub use model::{
    CommandSection, Options, RawConfigFile, ReportSection, WatchSection, DEFAULT_LATENCY,
};
pub use validate::{parse_duration, MAX_DURATION};
