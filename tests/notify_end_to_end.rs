// tests/notify_end_to_end.rs
//
// Drives the pipeline with the real OS notifier. Timing depends on the host,
// so generous margins are used around a 200ms latency.

#![cfg(target_os = "linux")]

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use settlewatch::engine::{Pipeline, PipelineSummary};
use settlewatch::errors::Result as SettleResult;
use settlewatch::fs::RealFileSystem;
use settlewatch::watch::{directories_to_watch, spawn_notifier, PathFilter, WatchExpander};
use settlewatch_test_utils::builders::OptionsBuilder;
use settlewatch_test_utils::fake_runner::FakeRunner;
use settlewatch_test_utils::init_tracing;
use settlewatch_test_utils::sink::SharedBuffer;

type TestResult = std::result::Result<(), Box<dyn Error>>;

struct Running {
    out: SharedBuffer,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<SettleResult<PipelineSummary>>,
}

fn start(builder: OptionsBuilder, root: &Path) -> std::result::Result<Running, Box<dyn Error>> {
    let options = builder
        .directories(&[root.to_str().ok_or("non-utf8 temp dir")?])
        .latency(Duration::from_millis(200))
        .build();

    let filter = PathFilter::new(options.exclude.clone());
    let dirs = directories_to_watch(&options.directories, options.subdirs, &filter);
    let (registrar, source) = spawn_notifier()?;
    let mut expander = WatchExpander::new(registrar, options.subdirs);
    expander.watch_initial(&dirs)?;

    let out = SharedBuffer::new();
    let (stop, stopped) = oneshot::channel::<()>();
    let pipeline = Pipeline::new(options, expander, Arc::new(RealFileSystem));
    let sink = out.clone();
    let handle = tokio::spawn(async move {
        pipeline
            .run(source, Box::new(FakeRunner::new()), sink, async {
                let _ = stopped.await;
            })
            .await
    });

    Ok(Running { out, stop, handle })
}

async fn pause(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test]
async fn files_written_together_share_a_group_line() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().canonicalize()?;
    let running = start(OptionsBuilder::new().group(), &root)?;

    std::fs::write(root.join("foo"), b"1")?;
    pause(20).await;
    std::fs::write(root.join("bar"), b"2")?;
    pause(1200).await;
    std::fs::write(root.join("blah"), b"3")?;
    pause(1200).await;

    let _ = running.stop.send(());
    running.handle.await??;

    let expected = format!(
        "{0}/foo\t{0}/bar\n{0}/blah\n",
        root.display()
    );
    assert_eq!(running.out.contents(), expected);
    Ok(())
}

#[tokio::test]
async fn files_in_a_new_subdirectory_are_reported() -> TestResult {
    init_tracing();
    let tmp = tempfile::tempdir()?;
    let root = tmp.path().canonicalize()?;
    let running = start(OptionsBuilder::new().subdirs(true).exclude("/x[^/]*$"), &root)?;

    std::fs::create_dir(root.join("sub"))?;
    pause(60).await;
    std::fs::write(root.join("sub/file"), b"hello")?;
    std::fs::write(root.join("sub/xignored"), b"nope")?;
    pause(1500).await;

    let _ = running.stop.send(());
    let summary = running.handle.await??;

    let expected = format!("{0}/sub\t{0}/sub/file\n", root.display());
    assert_eq!(running.out.contents(), expected);
    assert_eq!(summary.watched_dirs, 2);
    Ok(())
}
