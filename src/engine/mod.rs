// src/engine/mod.rs

//! Event consolidation engine.
//!
//! This module ties together:
//! - the per-path debouncer (one task per distinct path)
//! - the batch accumulator, or the grouping streamer
//! - the pipeline runtime that wires ingestion, consolidation, reporting and
//!   command dispatch, and shuts them down in order
//!
//! The pure batching state lives in [`core`]; the async shells around it are
//! [`accumulator`] and [`grouping`].

pub mod accumulator;
pub mod core;
pub mod debounce;
pub mod grouping;
pub mod runtime;

pub use accumulator::spawn_accumulator;
pub use core::{AccumulatorState, GroupState};
pub use debounce::{spawn_debouncer, DebounceSummary};
pub use grouping::spawn_grouper;
pub use runtime::{Pipeline, PipelineSummary};
