// src/engine/runtime.rs

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::accumulator::spawn_accumulator;
use super::debounce::{spawn_debouncer, DebounceSummary};
use super::grouping::spawn_grouper;
use crate::config::Options;
use crate::errors::{Error, Result};
use crate::exec::{spawn_dispatcher, CommandRunner, DispatchSummary};
use crate::fs::FileSystem;
use crate::report::{spawn_batch_reporter, spawn_group_reporter, Reporter};
use crate::watch::{Ingestor, NotifierMessage, PathFilter, WatchExpander, WatchRegistrar};

/// Buffer size of the channels between stages.
const STAGE_CAPACITY: usize = 64;

/// How long queued commands may keep running after shutdown.
pub const DISPATCH_GRACE: Duration = Duration::from_secs(5);

/// Counters collected once every stage has stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    pub debounce: DebounceSummary,
    /// Batches written by the reporter.
    pub batches: usize,
    /// Directories watched when ingestion stopped.
    pub watched_dirs: usize,
    /// `None` when no command is configured.
    pub dispatch: Option<DispatchSummary>,
}

/// The whole consolidation pipeline:
///
/// ```text
/// notifier -> ingest (filter, stat, expand) -> debounce (task per path)
///          -> accumulate | group -> report -> command dispatch
/// ```
///
/// Options are passed in explicitly; nothing here reads global state, so
/// several pipelines can run side by side in tests.
pub struct Pipeline<R: WatchRegistrar> {
    options: Options,
    ingestor: Ingestor<R>,
}

impl<R: WatchRegistrar> std::fmt::Debug for Pipeline<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("ingestor", &self.ingestor)
            .finish()
    }
}

impl<R: WatchRegistrar> Pipeline<R> {
    /// `expander` should already hold the initial watches.
    pub fn new(options: Options, expander: WatchExpander<R>, fs: Arc<dyn FileSystem>) -> Self {
        let filter = PathFilter::new(options.exclude.clone());
        Self {
            options,
            ingestor: Ingestor::new(filter, expander, fs),
        }
    }

    /// Run until `shutdown` resolves, a fatal error occurs, or the output
    /// sink fails.
    ///
    /// Shutdown order: ingestion stops and the expander closes; the debounce
    /// stage cancels and joins every unit; the accumulator (or grouper)
    /// discards its partial batch; the reporter drains; queued commands get
    /// [`DISPATCH_GRACE`] to finish before being aborted.
    pub async fn run<W, F>(
        self,
        source: mpsc::UnboundedReceiver<NotifierMessage>,
        runner: Box<dyn CommandRunner>,
        out: W,
        shutdown: F,
    ) -> Result<PipelineSummary>
    where
        W: AsyncWrite + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        let Pipeline { options, ingestor } = self;
        let latency = options.latency;
        info!(
            ?latency,
            mode = ?options.mode,
            raw = options.is_raw(),
            "pipeline starting"
        );

        let (raw_tx, raw_rx) = mpsc::channel(STAGE_CAPACITY);
        let (settled_tx, settled_rx) = mpsc::channel(STAGE_CAPACITY);

        let (dispatch_tx, dispatcher) = match options.command {
            Some(ref template) => {
                let (tx, handle) = spawn_dispatcher(template.clone(), runner);
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };
        let reporter = Reporter::new(out, options.long_format, dispatch_tx);

        let debouncer = spawn_debouncer(latency, raw_rx, settled_tx);
        let (stage, mut report) = if options.group() {
            let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
            (
                spawn_grouper(latency, settled_rx, tx),
                spawn_group_reporter(reporter, rx),
            )
        } else {
            let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
            (
                spawn_accumulator(latency, settled_rx, tx),
                spawn_batch_reporter(reporter, rx),
            )
        };

        // The reporter only ends early when its sink fails; treat that like
        // a shutdown request so ingestion still hands back its expander.
        let mut report_result = None;
        let stop = async {
            tokio::select! {
                _ = shutdown => {}
                res = &mut report => {
                    warn!("reporter stopped early; shutting down pipeline");
                    report_result = Some(res);
                }
            }
        };

        // Ingestion runs on this task and owns the only raw-event sender, so
        // its return starts the shutdown cascade.
        let ingest_result = ingestor
            .run(source, raw_tx, stop)
            .await
            .map(|expander| expander.watched_count());

        let debounce = debouncer.await.map_err(Error::from)?;
        stage.await.map_err(Error::from)?;
        let report_result = match report_result {
            Some(res) => res,
            None => report.await,
        };
        let batches = report_result.map_err(Error::from)?;

        let dispatch = match dispatcher {
            Some(handle) => join_dispatcher(handle).await,
            None => None,
        };

        let watched_dirs = ingest_result?;
        let batches = batches?;
        let summary = PipelineSummary {
            debounce,
            batches,
            watched_dirs,
            dispatch,
        };
        info!(?summary, "pipeline stopped");
        Ok(summary)
    }
}

async fn join_dispatcher(
    mut handle: tokio::task::JoinHandle<DispatchSummary>,
) -> Option<DispatchSummary> {
    match tokio::time::timeout(DISPATCH_GRACE, &mut handle).await {
        Ok(Ok(summary)) => Some(summary),
        Ok(Err(err)) => {
            warn!(error = %err, "command dispatcher ended abnormally");
            None
        }
        Err(_) => {
            warn!(grace = ?DISPATCH_GRACE, "command still running at shutdown; aborting it");
            handle.abort();
            debug!("command dispatcher aborted");
            None
        }
    }
}
