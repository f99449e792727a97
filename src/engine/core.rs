// src/engine/core.rs

//! Pure batching state machines.
//!
//! This module contains the synchronous, deterministic halves of the two
//! output stages:
//! - [`AccumulatorState`] buffers settled events into a [`Batch`]
//! - [`GroupState`] holds the single "prior" event of grouping mode
//!
//! The async shells (`engine::accumulator`, `engine::grouping`) own the
//! window timer and the channels; they only call into these types. The
//! cores have no Tokio types and do no IO, so they can be exercised directly
//! in tests.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;

use crate::types::{Batch, GroupedEvent, SettledEvent};

/// Pending contents of the current accumulation window.
///
/// `entries` keeps first-arrival order; `index` maps each path to its slot so
/// a path is never stored twice.
#[derive(Debug, Default)]
pub struct AccumulatorState {
    entries: Vec<SettledEvent>,
    index: HashMap<PathBuf, usize>,
}

impl AccumulatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settled event to the window.
    ///
    /// Returns `true` if the path was not yet pending. A repeated path keeps
    /// its original position; its kinds and metadata are merged.
    pub fn push(&mut self, event: SettledEvent) -> bool {
        match self.index.get(&event.path) {
            Some(&slot) => {
                self.entries[slot].absorb(event);
                false
            }
            None => {
                self.index.insert(event.path.clone(), self.entries.len());
                self.entries.push(event);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take the pending entries as a batch and reset to empty.
    ///
    /// Returns `None` when nothing is pending.
    pub fn flush(&mut self) -> Option<Batch> {
        if self.entries.is_empty() {
            return None;
        }
        self.index.clear();
        Some(Batch {
            entries: std::mem::take(&mut self.entries),
            flushed_at: Local::now(),
        })
    }

    /// Drop everything pending, returning how many paths were discarded.
    pub fn discard(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        self.index.clear();
        dropped
    }
}

/// Single-slot buffer of grouping mode.
#[derive(Debug, Default)]
pub struct GroupState {
    prior: Option<SettledEvent>,
}

impl GroupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `event` as the new prior.
    ///
    /// The previous prior, if any, is returned un-flagged: another event
    /// arrived inside the window, so it cannot be the last of its batch.
    pub fn push(&mut self, event: SettledEvent) -> Option<GroupedEvent> {
        self.prior.replace(event).map(|event| GroupedEvent {
            event,
            last_in_batch: false,
        })
    }

    /// The window closed: release the prior flagged as last of its batch.
    pub fn expire(&mut self) -> Option<GroupedEvent> {
        self.prior.take().map(|event| GroupedEvent {
            event,
            last_in_batch: true,
        })
    }

    pub fn has_prior(&self) -> bool {
        self.prior.is_some()
    }

    /// Drop the prior without emitting it.
    pub fn discard(&mut self) -> bool {
        self.prior.take().is_some()
    }
}
