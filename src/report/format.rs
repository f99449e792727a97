// src/report/format.rs

//! Line formatting for batches and grouped events.

use std::fmt::Write as _;

use crate::types::{Batch, GroupedEvent};

/// `2006-01-02 15:04:05.999`-style local timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One report line (including the trailing newline) for a batch.
///
/// - short: `path1\tpath2\n`
/// - long: `TIMESTAMP\tpath1\tKINDS1\tSIZE1\tpath2\tKINDS2\tSIZE2\n`, where
///   SIZE is empty when the path could not be inspected.
pub fn format_batch(batch: &Batch, long_format: bool) -> String {
    let mut line = String::new();

    if long_format {
        line.push_str(&batch.flushed_at.format(TIMESTAMP_FORMAT).to_string());
        for entry in &batch.entries {
            let size = entry
                .metadata
                .map(|m| m.size.to_string())
                .unwrap_or_default();
            let _ = write!(
                line,
                "\t{}\t{}\t{}",
                entry.path.display(),
                entry.kinds,
                size
            );
        }
    } else {
        let paths: Vec<String> = batch
            .paths()
            .map(|p| p.display().to_string())
            .collect();
        line.push_str(&paths.join("\t"));
    }

    line.push('\n');
    line
}

/// A grouped event: the path, then a tab, or a newline if it closes its
/// batch.
pub fn format_grouped(grouped: &GroupedEvent) -> String {
    let terminator = if grouped.last_in_batch { '\n' } else { '\t' };
    format!("{}{}", grouped.event.path.display(), terminator)
}
