// src/report/mod.rs

//! Turning batches into output lines.
//!
//! - [`format`] renders batches and grouped events as text.
//! - [`reporter`] owns the output sink and forwards finished batches to the
//!   command dispatcher.

pub mod format;
pub mod reporter;

pub use format::{format_batch, format_grouped, TIMESTAMP_FORMAT};
pub use reporter::{spawn_batch_reporter, spawn_group_reporter, Reporter};
