// src/engine/accumulator.rs

//! Async shell around [`AccumulatorState`]: owns the shared window timer.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::core::AccumulatorState;
use crate::types::{Batch, SettledEvent};

/// Spawn the batch accumulator.
///
/// Every settled event (re)arms one shared timer for `latency`; when it fires
/// the pending paths are flushed downstream as one [`Batch`]. A zero
/// `latency` flushes every event as its own batch.
///
/// When `input` closes the partial window is discarded: it is incomplete by
/// definition.
pub fn spawn_accumulator(
    latency: Duration,
    input: mpsc::Receiver<SettledEvent>,
    output: mpsc::Sender<Batch>,
) -> JoinHandle<()> {
    tokio::spawn(accumulate_loop(latency, input, output))
}

async fn accumulate_loop(
    latency: Duration,
    mut input: mpsc::Receiver<SettledEvent>,
    output: mpsc::Sender<Batch>,
) {
    let mut state = AccumulatorState::new();
    let timer = sleep(latency);
    tokio::pin!(timer);
    let mut armed = false;

    loop {
        tokio::select! {
            biased;

            msg = input.recv() => {
                let Some(event) = msg else {
                    let dropped = state.discard();
                    if dropped > 0 {
                        debug!(dropped, "discarding partial batch on shutdown");
                    }
                    break;
                };

                let is_new = state.push(event);
                debug!(is_new, pending = state.len(), "settled event accumulated");

                if latency.is_zero() {
                    if !send_batch(&mut state, &output).await {
                        break;
                    }
                } else {
                    timer.as_mut().reset(Instant::now() + latency);
                    armed = true;
                }
            }

            _ = &mut timer, if armed => {
                armed = false;
                if !send_batch(&mut state, &output).await {
                    break;
                }
            }
        }
    }

    info!("accumulator finished");
}

/// Returns `false` once the downstream receiver is gone.
async fn send_batch(state: &mut AccumulatorState, output: &mpsc::Sender<Batch>) -> bool {
    let Some(batch) = state.flush() else {
        return true;
    };
    debug!(paths = batch.len(), "flushing batch");
    if output.send(batch).await.is_err() {
        debug!("batch channel closed; accumulator stopping");
        return false;
    }
    true
}
