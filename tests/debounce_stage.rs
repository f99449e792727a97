// tests/debounce_stage.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use settlewatch::engine::spawn_debouncer;
use settlewatch::types::EventMask;
use settlewatch_test_utils::builders::raw;
use settlewatch_test_utils::harness::advance;
use settlewatch_test_utils::init_tracing;

const LATENCY: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn burst_on_one_path_settles_once_with_merged_kinds() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/foo", EventMask::CREATE)).await.unwrap();
    advance(Duration::from_millis(50)).await;
    in_tx.send(raw("/d/foo", EventMask::MODIFY)).await.unwrap();
    advance(Duration::from_millis(50)).await;
    in_tx.send(raw("/d/foo", EventMask::MODIFY)).await.unwrap();

    // Each event pushed the deadline back; 90ms after the last one the path
    // is still considered busy.
    advance(Duration::from_millis(90)).await;
    assert!(out_rx.try_recv().is_err(), "emitted before quiescence");

    let settled = timeout(Duration::from_millis(50), out_rx.recv())
        .await
        .expect("path should settle")
        .expect("channel open");
    assert_eq!(settled.path.to_str(), Some("/d/foo"));
    assert_eq!(settled.kinds, EventMask::CREATE | EventMask::MODIFY);

    advance(Duration::from_millis(500)).await;
    assert!(out_rx.try_recv().is_err(), "a burst must settle exactly once");

    drop(in_tx);
    let summary = handle.await.unwrap();
    assert_eq!(summary.units, 1);
    assert_eq!(summary.passed_through, 0);
}

#[tokio::test(start_paused = true)]
async fn busy_path_does_not_delay_a_quiet_one() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/busy", EventMask::MODIFY)).await.unwrap();
    in_tx.send(raw("/d/quiet", EventMask::CREATE)).await.unwrap();

    // Keep touching `busy` well past one latency period.
    for _ in 0..5 {
        advance(Duration::from_millis(60)).await;
        in_tx.send(raw("/d/busy", EventMask::MODIFY)).await.unwrap();
    }

    let first = out_rx.try_recv().expect("quiet path settled while busy path was active");
    assert_eq!(first.path.to_str(), Some("/d/quiet"));
    assert!(out_rx.try_recv().is_err());

    let second = timeout(Duration::from_millis(200), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.path.to_str(), Some("/d/busy"));

    drop(in_tx);
    assert_eq!(handle.await.unwrap().units, 2);
}

#[tokio::test(start_paused = true)]
async fn path_settles_again_after_a_new_burst() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/foo", EventMask::CREATE)).await.unwrap();
    advance(Duration::from_millis(300)).await;
    in_tx.send(raw("/d/foo", EventMask::MODIFY)).await.unwrap();
    advance(Duration::from_millis(300)).await;

    let first = out_rx.try_recv().unwrap();
    let second = out_rx.try_recv().unwrap();
    assert_eq!(first.kinds, EventMask::CREATE);
    assert_eq!(second.kinds, EventMask::MODIFY);

    drop(in_tx);
    // One unit per distinct path, reused across bursts.
    assert_eq!(handle.await.unwrap().units, 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_events() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/a", EventMask::CREATE)).await.unwrap();
    in_tx.send(raw("/d/b", EventMask::CREATE)).await.unwrap();
    advance(Duration::from_millis(50)).await;

    drop(in_tx);
    let summary = handle.await.unwrap();
    assert_eq!(summary.units, 2);

    // Every unit acknowledged termination, so the output is closed and empty.
    assert!(out_rx.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn zero_latency_passes_every_event_through() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(Duration::ZERO, in_rx, out_tx);

    for kinds in [EventMask::CREATE, EventMask::MODIFY, EventMask::MODIFY] {
        in_tx.send(raw("/d/foo", kinds)).await.unwrap();
    }
    drop(in_tx);

    let mut seen = Vec::new();
    while let Some(event) = out_rx.recv().await {
        seen.push(event.kinds);
    }
    assert_eq!(seen, vec![EventMask::CREATE, EventMask::MODIFY, EventMask::MODIFY]);

    let summary = handle.await.unwrap();
    assert_eq!(summary.units, 0);
    assert_eq!(summary.passed_through, 3);
}

#[tokio::test(start_paused = true)]
async fn burst_without_create_or_modify_is_not_emitted() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/gone", EventMask::ATTRIB)).await.unwrap();
    in_tx.send(raw("/d/gone", EventMask::DELETE)).await.unwrap();
    in_tx.send(raw("/d/moved", EventMask::RENAME)).await.unwrap();
    advance(Duration::from_millis(500)).await;
    assert!(out_rx.try_recv().is_err());

    drop(in_tx);
    assert_eq!(handle.await.unwrap().units, 2);
}

#[tokio::test(start_paused = true)]
async fn other_kinds_extend_the_burst_and_join_the_mask() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(LATENCY, in_rx, out_tx);

    in_tx.send(raw("/d/foo", EventMask::CREATE)).await.unwrap();
    advance(Duration::from_millis(90)).await;
    in_tx.send(raw("/d/foo", EventMask::ATTRIB)).await.unwrap();

    // The attribute change pushed the deadline to 190ms.
    advance(Duration::from_millis(60)).await;
    assert!(out_rx.try_recv().is_err(), "settled before the trailing event went quiet");

    let settled = timeout(Duration::from_millis(100), out_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(settled.kinds, EventMask::CREATE | EventMask::ATTRIB);

    drop(in_tx);
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn zero_latency_drops_events_without_create_or_modify() {
    init_tracing();

    let (in_tx, in_rx) = mpsc::channel(16);
    let (out_tx, mut out_rx) = mpsc::channel(16);
    let handle = spawn_debouncer(Duration::ZERO, in_rx, out_tx);

    in_tx.send(raw("/d/foo", EventMask::DELETE)).await.unwrap();
    in_tx.send(raw("/d/foo", EventMask::CREATE)).await.unwrap();
    drop(in_tx);

    let only = out_rx.recv().await.unwrap();
    assert_eq!(only.kinds, EventMask::CREATE);
    assert!(out_rx.recv().await.is_none());

    let summary = handle.await.unwrap();
    assert_eq!(summary.passed_through, 1);
    assert_eq!(summary.unreported, 1);
}
