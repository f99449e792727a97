// src/report/reporter.rs

use std::path::PathBuf;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::format::{format_batch, format_grouped};
use crate::errors::Result;
use crate::types::{Batch, GroupedEvent};

/// Writes report lines to a sink and hands finished batches to the command
/// dispatcher.
///
/// The dispatcher channel is unbounded so a slow or hung command never
/// blocks reporting (and therefore never blocks accumulation). Writes go
/// through `AsyncWrite`, so a stalled stdout only parks this task.
pub struct Reporter<W: AsyncWrite + Unpin> {
    out: W,
    long_format: bool,
    dispatch: Option<mpsc::UnboundedSender<Vec<PathBuf>>>,
    /// Paths of the grouping-mode batch whose line is still open.
    open_group: Vec<PathBuf>,
    batches: usize,
}

impl<W: AsyncWrite + Unpin> std::fmt::Debug for Reporter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("long_format", &self.long_format)
            .field("batches", &self.batches)
            .finish_non_exhaustive()
    }
}

impl<W: AsyncWrite + Unpin> Reporter<W> {
    pub fn new(
        out: W,
        long_format: bool,
        dispatch: Option<mpsc::UnboundedSender<Vec<PathBuf>>>,
    ) -> Self {
        Self {
            out,
            long_format,
            dispatch,
            open_group: Vec::new(),
            batches: 0,
        }
    }

    pub async fn report_batch(&mut self, batch: &Batch) -> Result<()> {
        let line = format_batch(batch, self.long_format);
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await?;
        self.batches += 1;
        self.dispatch(batch.paths().map(|p| p.to_path_buf()).collect());
        Ok(())
    }

    pub async fn report_grouped(&mut self, grouped: GroupedEvent) -> Result<()> {
        self.out.write_all(format_grouped(&grouped).as_bytes()).await?;
        self.out.flush().await?;
        self.open_group.push(grouped.event.path);
        if grouped.last_in_batch {
            self.batches += 1;
            let paths = std::mem::take(&mut self.open_group);
            self.dispatch(paths);
        }
        Ok(())
    }

    /// Terminate a group line left open by shutdown and return the number of
    /// batches reported. The unfinished group is not dispatched.
    pub async fn finish(mut self) -> Result<usize> {
        if !self.open_group.is_empty() {
            debug!(
                paths = self.open_group.len(),
                "terminating unfinished group line on shutdown"
            );
            self.out.write_all(b"\n").await?;
        }
        self.out.flush().await?;
        Ok(self.batches)
    }

    fn dispatch(&self, paths: Vec<PathBuf>) {
        if let Some(ref tx) = self.dispatch {
            if tx.send(paths).is_err() {
                warn!("command dispatcher has stopped; batch not dispatched");
            }
        }
    }
}

/// Spawn the reporter for accumulate/raw mode.
pub fn spawn_batch_reporter<W>(
    mut reporter: Reporter<W>,
    mut input: mpsc::Receiver<Batch>,
) -> JoinHandle<Result<usize>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(batch) = input.recv().await {
            reporter.report_batch(&batch).await?;
        }
        finish(reporter).await
    })
}

/// Spawn the reporter for grouping mode.
pub fn spawn_group_reporter<W>(
    mut reporter: Reporter<W>,
    mut input: mpsc::Receiver<GroupedEvent>,
) -> JoinHandle<Result<usize>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(grouped) = input.recv().await {
            reporter.report_grouped(grouped).await?;
        }
        finish(reporter).await
    })
}

async fn finish<W: AsyncWrite + Unpin>(reporter: Reporter<W>) -> Result<usize> {
    let batches = reporter.finish().await?;
    info!(batches, "reporter finished");
    Ok(batches)
}
