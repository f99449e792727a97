// src/exec/dispatcher.rs

//! Background loop that runs the configured command once per batch.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backend::CommandRunner;

/// Counters reported when the dispatcher stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub runs: usize,
    pub failures: usize,
}

/// Spawn the command dispatcher.
///
/// The returned sender accepts the paths of each finished batch. Batches are
/// run one after another, in order; a failure is logged together with the
/// captured output and the next batch proceeds independently. Nothing is
/// retried.
pub fn spawn_dispatcher(
    template: Vec<String>,
    mut runner: Box<dyn CommandRunner>,
) -> (mpsc::UnboundedSender<Vec<PathBuf>>, JoinHandle<DispatchSummary>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();

    let handle = tokio::spawn(async move {
        info!(command = ?template, "command dispatcher started");
        let mut summary = DispatchSummary::default();

        while let Some(paths) = rx.recv().await {
            summary.runs += 1;
            if !run_batch(runner.as_mut(), &template, &paths).await {
                summary.failures += 1;
            }
        }

        info!(
            runs = summary.runs,
            failures = summary.failures,
            "command dispatcher finished (channel closed)"
        );
        summary
    });

    (tx, handle)
}

/// Returns `true` if the command ran and exited successfully.
async fn run_batch(runner: &mut dyn CommandRunner, template: &[String], paths: &[PathBuf]) -> bool {
    match runner.run_command(template, paths).await {
        Ok(output) if output.success => {
            debug!(
                command = ?template,
                paths = paths.len(),
                output = %output.combined_lossy(),
                "command succeeded"
            );
            true
        }
        Ok(output) => {
            warn!(
                command = ?template,
                ?paths,
                exit_code = ?output.code,
                output = %output.combined_lossy(),
                "command failed"
            );
            false
        }
        Err(err) => {
            warn!(
                command = ?template,
                ?paths,
                error = %err,
                "command could not be run"
            );
            false
        }
    }
}
