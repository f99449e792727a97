// src/watch/ingest.rs

//! The raw-event ingestion loop: filter, inspect, expand, forward.

use std::future::Future;
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::errors::{Result, SettleError};
use crate::fs::FileSystem;
use crate::types::RawEvent;
use crate::watch::expander::{WatchExpander, WatchRegistrar};
use crate::watch::filter::PathFilter;
use crate::watch::notifier::NotifierMessage;

/// First stage of the pipeline.
///
/// Consumes notifier messages and forwards accepted raw events to the
/// debouncer. This is the only place watches are added after startup.
pub struct Ingestor<R: WatchRegistrar> {
    filter: PathFilter,
    expander: WatchExpander<R>,
    fs: Arc<dyn FileSystem>,
}

impl<R: WatchRegistrar> std::fmt::Debug for Ingestor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("filter", &self.filter)
            .field("expander", &self.expander)
            .finish_non_exhaustive()
    }
}

impl<R: WatchRegistrar> Ingestor<R> {
    pub fn new(filter: PathFilter, expander: WatchExpander<R>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            filter,
            expander,
            fs,
        }
    }

    /// Run until `shutdown` resolves or a fatal error occurs.
    ///
    /// Returns the expander so callers can inspect the final watch set.
    /// Fatal errors: a watch limit reported by the notifier or hit while
    /// expanding, and the notifier channel closing.
    pub async fn run<F>(
        mut self,
        mut source: mpsc::UnboundedReceiver<NotifierMessage>,
        output: mpsc::Sender<RawEvent>,
        shutdown: F,
    ) -> Result<WatchExpander<R>>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown requested; stopping ingestion");
                    self.expander.close();
                    return Ok(self.expander);
                }

                msg = source.recv() => match msg {
                    None => {
                        self.expander.close();
                        return Err(SettleError::NotifierClosed);
                    }
                    Some(NotifierMessage::Error(err)) => {
                        if err.is_fatal() {
                            self.expander.close();
                            return Err(err.into());
                        }
                        warn!(error = %err, "notifier error");
                    }
                    Some(NotifierMessage::Event(event)) => {
                        let Some(event) = self.accept(event)? else { continue };
                        if output.send(event).await.is_err() {
                            debug!("raw-event channel closed; stopping ingestion");
                            self.expander.close();
                            return Ok(self.expander);
                        }
                    }
                },
            }
        }
    }

    /// Filter one event, attach its metadata and expand watches.
    ///
    /// `Ok(None)` means the event is dropped.
    pub fn accept(&mut self, event: RawEvent) -> Result<Option<RawEvent>> {
        trace!(path = ?event.path, kinds = %event.kinds, "from notifier");

        let Some(event) = self.filter.apply(event) else {
            debug!("excluded by pattern");
            return Ok(None);
        };

        let metadata = match self.fs.stat(&event.path) {
            Ok(meta) => Some(meta),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?event.path, "path vanished before inspection");
                None
            }
            Err(err) => {
                warn!(path = ?event.path, error = %err, "could not inspect path");
                None
            }
        };
        let event = event.with_metadata(metadata);

        self.expander.observe(&event)?;

        // Every kind is forwarded: deletions and attribute changes still keep
        // a path busy and show up in the merged kinds of its burst.
        Ok(Some(event))
    }

    pub fn expander(&self) -> &WatchExpander<R> {
        &self.expander
    }
}
