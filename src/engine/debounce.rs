// src/engine/debounce.rs

//! Per-path quiescence detection.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, trace, warn};

use crate::types::{RawEvent, SettledEvent};

/// Buffer between the dispatcher and a single unit.
const UNIT_CHANNEL_CAPACITY: usize = 16;

/// What the debounce stage reports once it has shut down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceSummary {
    /// Number of distinct paths that got their own unit.
    pub units: usize,
    /// Raw events passed straight through because latency was zero.
    pub passed_through: usize,
    /// Zero-latency events dropped because they carried neither CREATE nor
    /// MODIFY.
    pub unreported: usize,
}

/// Handle for one running unit.
///
/// - `tx` feeds raw events for exactly one path.
/// - `cancel` tells the unit to stop without emitting what it holds.
/// - `handle` is awaited as the unit's acknowledgment of termination.
struct DebounceUnit {
    tx: mpsc::Sender<RawEvent>,
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl DebounceUnit {
    fn spawn(path: PathBuf, latency: Duration, output: mpsc::Sender<SettledEvent>) -> Self {
        let (tx, rx) = mpsc::channel(UNIT_CHANNEL_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = tokio::spawn(run_unit(path, latency, rx, cancel_rx, output));
        Self {
            tx,
            cancel: Some(cancel_tx),
            handle,
        }
    }
}

/// Spawn the debounce stage.
///
/// Raw events are fanned out to one task per distinct path, created lazily on
/// the first event for that path. Each task emits a [`SettledEvent`] once its
/// path has been quiet for `latency`.
///
/// With a zero `latency` nothing is debounced: every raw event is forwarded
/// immediately.
///
/// Only settled events whose merged kinds include CREATE or MODIFY go
/// downstream; a burst of deletions or attribute changes alone is dropped.
/// Other kinds still reset the quiet period and are carried in the mask.
///
/// The stage runs until `input` closes. It then cancels every unit and waits
/// for each one to finish before dropping its `output` sender, so nothing is
/// emitted downstream after shutdown has begun.
pub fn spawn_debouncer(
    latency: Duration,
    input: mpsc::Receiver<RawEvent>,
    output: mpsc::Sender<SettledEvent>,
) -> JoinHandle<DebounceSummary> {
    tokio::spawn(dispatch_loop(latency, input, output))
}

async fn dispatch_loop(
    latency: Duration,
    mut input: mpsc::Receiver<RawEvent>,
    output: mpsc::Sender<SettledEvent>,
) -> DebounceSummary {
    debug!(?latency, "debounce stage started");

    let mut summary = DebounceSummary::default();
    let mut units: HashMap<PathBuf, DebounceUnit> = HashMap::new();

    while let Some(event) = input.recv().await {
        if latency.is_zero() {
            if !event.kinds.is_reportable() {
                trace!(path = ?event.path, kinds = %event.kinds, "not a create/modify event; not reported");
                summary.unreported += 1;
                continue;
            }
            summary.passed_through += 1;
            if output.send(event.into()).await.is_err() {
                warn!("settled-event channel closed; stopping debounce stage");
                break;
            }
            continue;
        }

        let unit = units.entry(event.path.clone()).or_insert_with(|| {
            trace!(path = ?event.path, "creating debounce unit");
            DebounceUnit::spawn(event.path.clone(), latency, output.clone())
        });

        let path = event.path.clone();
        if unit.tx.send(event).await.is_err() {
            // Only happens when the unit stopped because downstream is gone.
            warn!(?path, "debounce unit is no longer running; event dropped");
        }
    }

    summary.units = units.len();
    shutdown_units(units).await;
    info!(units = summary.units, "debounce stage finished");
    summary
}

/// Cancel every unit, then wait for each to acknowledge by finishing.
async fn shutdown_units(units: HashMap<PathBuf, DebounceUnit>) {
    let mut pending = Vec::with_capacity(units.len());
    for (path, mut unit) in units {
        if let Some(cancel) = unit.cancel.take() {
            // An error only means the unit already stopped on its own.
            let _ = cancel.send(());
        }
        drop(unit.tx);
        pending.push((path, unit.handle));
    }

    for (path, handle) in pending {
        if let Err(err) = handle.await {
            warn!(?path, error = %err, "debounce unit ended abnormally");
        }
    }
}

/// Quiescence detector for one path.
///
/// Idle until the first event, then pending with a deadline `latency` after
/// the most recent event. When the deadline passes the accumulated event is
/// emitted and the unit goes idle again.
async fn run_unit(
    path: PathBuf,
    latency: Duration,
    mut input: mpsc::Receiver<RawEvent>,
    mut cancel: oneshot::Receiver<()>,
    output: mpsc::Sender<SettledEvent>,
) {
    let mut pending: Option<SettledEvent> = None;
    let timer = sleep(latency);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            _ = &mut cancel => {
                if pending.is_some() {
                    trace!(?path, "unit cancelled with a pending event; discarding it");
                }
                break;
            }

            msg = input.recv() => {
                let Some(event) = msg else { break };
                pending = Some(match pending.take() {
                    Some(mut settled) => {
                        settled.merge(event);
                        settled
                    }
                    None => event.into(),
                });
                timer.as_mut().reset(Instant::now() + latency);
            }

            _ = &mut timer, if pending.is_some() => {
                let Some(settled) = pending.take() else { continue };
                if !settled.kinds.is_reportable() {
                    debug!(?path, kinds = %settled.kinds, "settled without create/modify; not reported");
                    continue;
                }
                trace!(?path, kinds = %settled.kinds, "path settled");
                tokio::select! {
                    biased;
                    _ = &mut cancel => break,
                    res = output.send(settled) => {
                        if res.is_err() {
                            debug!(?path, "settled-event channel closed; unit stopping");
                            break;
                        }
                    }
                }
            }
        }
    }
}
