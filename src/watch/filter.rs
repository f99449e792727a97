// src/watch/filter.rs

use std::path::Path;

use regex::Regex;

use crate::types::RawEvent;

/// Drops events whose path matches the exclusion pattern.
///
/// The pattern is matched anywhere in the full path string, so anchors
/// (`/x[^/]*$`) are needed to target file names.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude: Option<Regex>,
}

impl PathFilter {
    pub fn new(exclude: Option<Regex>) -> Self {
        Self { exclude }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        match self.exclude {
            Some(ref re) => re.is_match(&path.to_string_lossy()),
            None => false,
        }
    }

    /// Pass the event through unchanged, or `None` if it must be dropped.
    pub fn apply(&self, event: RawEvent) -> Option<RawEvent> {
        if self.is_excluded(&event.path) {
            None
        } else {
            Some(event)
        }
    }
}
