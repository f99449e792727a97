// src/watch/mod.rs

//! File watching and raw-event ingestion.
//!
//! This module is responsible for:
//! - Wiring up the OS notifier (`notify`), one non-recursive watch per
//!   directory (`notifier`).
//! - Enumerating the initial directories when subdirectories are tracked
//!   (`walk`).
//! - Dropping excluded paths (`filter`).
//! - Adding watches for directories created while running (`expander`).
//! - The ingestion loop that ties these together (`ingest`).
//!
//! It does **not** know about timing; it only turns notifications into
//! accepted [`crate::types::RawEvent`]s.

pub mod expander;
pub mod filter;
pub mod ingest;
pub mod notifier;
pub mod walk;

pub use expander::{Expansion, WatchExpander, WatchRegistrar};
pub use filter::PathFilter;
pub use ingest::Ingestor;
pub use notifier::{spawn_notifier, NotifierMessage, NotifyRegistrar};
pub use walk::directories_to_watch;
