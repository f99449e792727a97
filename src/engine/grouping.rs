// src/engine/grouping.rs

//! Async shell around [`GroupState`].

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use super::core::GroupState;
use crate::types::{GroupedEvent, SettledEvent};

/// Spawn the grouping streamer.
///
/// Produces the same batch boundaries as the accumulator but forwards each
/// event as soon as a successor arrives, flagging only the last event of each
/// batch. With a zero `latency` every event is its own batch.
pub fn spawn_grouper(
    latency: Duration,
    input: mpsc::Receiver<SettledEvent>,
    output: mpsc::Sender<GroupedEvent>,
) -> JoinHandle<()> {
    tokio::spawn(group_loop(latency, input, output))
}

async fn group_loop(
    latency: Duration,
    mut input: mpsc::Receiver<SettledEvent>,
    output: mpsc::Sender<GroupedEvent>,
) {
    let mut state = GroupState::new();
    let timer = sleep(latency);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            msg = input.recv() => {
                let Some(event) = msg else {
                    if state.discard() {
                        debug!("discarding unfinished group on shutdown");
                    }
                    break;
                };

                if let Some(prior) = state.push(event) {
                    if output.send(prior).await.is_err() {
                        break;
                    }
                }

                if latency.is_zero() {
                    if let Some(last) = state.expire() {
                        if output.send(last).await.is_err() {
                            break;
                        }
                    }
                } else {
                    timer.as_mut().reset(Instant::now() + latency);
                }
            }

            _ = &mut timer, if state.has_prior() => {
                if let Some(last) = state.expire() {
                    debug!(path = ?last.event.path, "group closed");
                    if output.send(last).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    info!("grouping streamer finished");
}
