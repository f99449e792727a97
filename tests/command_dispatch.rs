// tests/command_dispatch.rs

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use settlewatch::exec::{spawn_dispatcher, CommandRunner, DryRunRunner};
use settlewatch::types::EventMask;
use settlewatch_test_utils::builders::{paths, OptionsBuilder};
use settlewatch_test_utils::fake_registrar::FakeRegistrar;
use settlewatch_test_utils::fake_runner::FakeRunner;
use settlewatch_test_utils::harness::{advance, PipelineHarness};
use settlewatch_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const LATENCY: Duration = Duration::from_millis(100);

#[tokio::test(start_paused = true)]
async fn each_batch_runs_the_command_with_its_paths_appended() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start(
        OptionsBuilder::new()
            .latency(LATENCY)
            .command(&["make", "-C", "build"])
            .build(),
    );

    harness.emit("/watched/foo", EventMask::CREATE);
    advance(Duration::from_millis(10)).await;
    harness.emit("/watched/bar", EventMask::CREATE);
    advance(Duration::from_millis(500)).await;
    harness.emit("/watched/blah", EventMask::MODIFY);
    advance(Duration::from_millis(500)).await;

    let runner = harness.runner.clone();
    let summary = harness.shutdown().await?;

    let calls = runner.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].template, vec!["make", "-C", "build"]);
    assert_eq!(calls[0].paths, paths(&["/watched/foo", "/watched/bar"]));
    assert_eq!(calls[1].paths, paths(&["/watched/blah"]));

    let dispatch = summary.dispatch.expect("dispatcher configured");
    assert_eq!(dispatch.runs, 2);
    assert_eq!(dispatch.failures, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_command_does_not_stop_later_batches() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start_with(
        OptionsBuilder::new().latency(LATENCY).command(&["false"]).build(),
        Default::default(),
        FakeRegistrar::new(),
        FakeRunner::new().failing(),
    );

    harness.emit("/watched/one", EventMask::CREATE);
    advance(Duration::from_millis(500)).await;
    harness.emit("/watched/two", EventMask::CREATE);
    advance(Duration::from_millis(500)).await;

    assert_eq!(harness.out.lines(), vec!["/watched/one", "/watched/two"]);
    let dispatch = harness.shutdown().await?.dispatch.unwrap();
    assert_eq!(dispatch.runs, 2);
    assert_eq!(dispatch.failures, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_command_does_not_block_reporting() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start_with(
        OptionsBuilder::new().latency(LATENCY).command(&["sleep"]).build(),
        Default::default(),
        FakeRegistrar::new(),
        FakeRunner::new().with_delay(Duration::from_secs(2)),
    );

    for path in ["/watched/a", "/watched/b", "/watched/c"] {
        harness.emit(path, EventMask::CREATE);
        advance(Duration::from_millis(500)).await;
    }

    // Reported on schedule while the first command is still running.
    assert_eq!(harness.out.lines().len(), 3);
    assert!(harness.runner.calls().is_empty());

    let runner = harness.runner.clone();
    let dispatch = harness.shutdown().await?.dispatch.unwrap();
    assert_eq!(dispatch.runs, 3);
    assert_eq!(runner.calls().len(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hung_command_is_abandoned_after_the_grace_period() -> TestResult {
    init_tracing();
    let harness = PipelineHarness::start_with(
        OptionsBuilder::new().latency(LATENCY).command(&["hang"]).build(),
        Default::default(),
        FakeRegistrar::new(),
        FakeRunner::new().with_delay(Duration::from_secs(3600)),
    );

    harness.emit("/watched/foo", EventMask::CREATE);
    advance(Duration::from_millis(500)).await;

    let summary = harness.shutdown().await?;
    assert_eq!(summary.batches, 1);
    assert_eq!(summary.dispatch, None);
    Ok(())
}

#[tokio::test]
async fn dispatcher_runs_batches_in_order() {
    init_tracing();
    let runner = FakeRunner::new();
    let (tx, handle) = spawn_dispatcher(vec!["echo".to_string()], Box::new(runner.clone()));

    tx.send(paths(&["a"])).unwrap();
    tx.send(paths(&["b", "c"])).unwrap();
    drop(tx);

    let summary = with_timeout(handle).await.unwrap();
    assert_eq!(summary.runs, 2);
    let calls: Vec<Vec<PathBuf>> = runner.calls().into_iter().map(|c| c.paths).collect();
    assert_eq!(calls, vec![paths(&["a"]), paths(&["b", "c"])]);
}

#[tokio::test]
async fn dry_run_reports_success_without_running() -> TestResult {
    let mut runner = DryRunRunner;
    let template = vec!["definitely-not-a-real-program".to_string()];
    let output = runner.run_command(&template, &paths(&["x"])).await?;
    assert!(output.success);
    assert!(output.combined.is_empty());
    Ok(())
}

#[cfg(unix)]
mod process {
    use super::*;
    use settlewatch::exec::ProcessRunner;

    #[tokio::test]
    async fn paths_are_appended_as_arguments() -> TestResult {
        let mut runner = ProcessRunner;
        let template = vec!["echo".to_string(), "changed:".to_string()];
        let output = runner
            .run_command(&template, &paths(&["/tmp/a", "/tmp/b"]))
            .await?;

        assert!(output.success);
        assert_eq!(output.code, Some(0));
        assert_eq!(output.combined_lossy(), "changed: /tmp/a /tmp/b\n");
        Ok(())
    }

    #[tokio::test]
    async fn failure_captures_exit_code_and_combined_output() -> TestResult {
        let mut runner = ProcessRunner;
        let template = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo out $1; echo err >&2; exit 3".to_string(),
            "sh".to_string(),
        ];
        let output = runner.run_command(&template, &paths(&["file"])).await?;

        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.combined_lossy(), "out file\nerr\n");
        Ok(())
    }

    #[tokio::test]
    async fn stdout_and_stderr_are_interleaved_in_write_order() -> TestResult {
        let mut runner = ProcessRunner;
        let template = vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo a; echo b >&2; echo c; echo d >&2".to_string(),
        ];
        let output = runner.run_command(&template, &[]).await?;

        assert!(output.success);
        assert_eq!(output.combined_lossy(), "a\nb\nc\nd\n");
        Ok(())
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let mut runner = ProcessRunner;
        let template = vec!["settlewatch-no-such-program".to_string()];
        assert!(runner.run_command(&template, &[]).await.is_err());
    }
}
