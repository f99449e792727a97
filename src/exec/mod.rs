// src/exec/mod.rs

//! Command execution layer.
//!
//! - [`backend`] provides the `CommandRunner` trait, the production
//!   `ProcessRunner` built on `tokio::process::Command`, and the
//!   `DryRunRunner` used by `--dry-run`. Tests can replace the runner with a
//!   fake implementation.
//! - [`dispatcher`] owns the background loop that runs the command once per
//!   reported batch, appending the batch's paths as trailing arguments.

pub mod backend;
pub mod dispatcher;

pub use backend::{CommandOutput, CommandRunner, DryRunRunner, ProcessRunner};
pub use dispatcher::{spawn_dispatcher, DispatchSummary};
