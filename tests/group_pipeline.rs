// tests/group_pipeline.rs

use std::error::Error;
use std::time::Duration;

use settlewatch::config::Options;
use settlewatch::types::EventMask;
use settlewatch_test_utils::builders::OptionsBuilder;
use settlewatch_test_utils::harness::{advance, PipelineHarness};
use settlewatch_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const LATENCY: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn paths_stream_as_they_settle_and_lines_close_with_the_window() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start(OptionsBuilder::new().latency(LATENCY).group().build());

    harness.emit("/watched/foo", EventMask::CREATE);
    advance(Duration::from_millis(10)).await;
    harness.emit("/watched/bar", EventMask::CREATE);

    // foo settled at 100ms and was held; bar's arrival at 110ms released it
    // unterminated.
    advance(Duration::from_millis(120)).await;
    assert_eq!(harness.output(), "/watched/foo\t");

    advance(Duration::from_millis(400)).await;
    assert_eq!(harness.output(), "/watched/foo\t/watched/bar\n");

    harness.emit("/watched/blah", EventMask::CREATE);
    advance(Duration::from_millis(500)).await;
    assert_eq!(harness.output(), "/watched/foo\t/watched/bar\n/watched/blah\n");

    assert_eq!(harness.shutdown().await?.batches, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn shutdown_terminates_an_open_group_line() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start(
        OptionsBuilder::new()
            .latency(LATENCY)
            .group()
            .command(&["make"])
            .build(),
    );

    harness.emit("/watched/foo", EventMask::CREATE);
    advance(Duration::from_millis(10)).await;
    harness.emit("/watched/bar", EventMask::CREATE);
    advance(Duration::from_millis(150)).await;

    let runner = harness.runner.clone();
    let out = harness.out.clone();
    let summary = harness.shutdown().await?;

    assert_eq!(out.contents(), "/watched/foo\t\n");
    assert_eq!(summary.batches, 0);
    // The unfinished group is not a batch, so nothing was dispatched.
    assert!(runner.calls().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn zero_latency_groups_hold_a_single_path() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start(
        OptionsBuilder::new().latency(Duration::ZERO).group().build(),
    );

    harness.emit("/watched/foo", EventMask::CREATE);
    harness.emit("/watched/bar", EventMask::MODIFY);
    advance(Duration::from_millis(10)).await;

    assert_eq!(harness.output(), "/watched/foo\n/watched/bar\n");
    harness.shutdown().await?;
    Ok(())
}

/// Replay the same timed script through a pipeline and return its output.
async fn replay(options: Options, script: &[(u64, &str)]) -> String {
    let harness = PipelineHarness::start(options);
    for (delay_ms, path) in script {
        advance(Duration::from_millis(*delay_ms)).await;
        harness.emit(path, EventMask::MODIFY);
    }
    advance(Duration::from_secs(2)).await;
    let out = harness.out.clone();
    harness.shutdown().await.expect("clean shutdown");
    out.contents()
}

#[tokio::test(start_paused = true)]
async fn grouping_produces_the_same_batches_as_accumulation() {
    init_tracing();

    // Distinct paths, staggered so settle order is deterministic; gaps of
    // 300ms close a window.
    let script = [
        (0, "/watched/a"),
        (10, "/watched/b"),
        (10, "/watched/c"),
        (300, "/watched/d"),
        (10, "/watched/e"),
        (300, "/watched/f"),
        (40, "/watched/g"),
        (40, "/watched/h"),
    ];

    let batched = replay(OptionsBuilder::new().latency(LATENCY).build(), &script).await;
    let grouped = replay(
        OptionsBuilder::new().latency(LATENCY).group().build(),
        &script,
    )
    .await;

    assert_eq!(
        batched,
        "/watched/a\t/watched/b\t/watched/c\n/watched/d\t/watched/e\n/watched/f\t/watched/g\t/watched/h\n"
    );
    assert_eq!(grouped, batched);
}
