use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use settlewatch::config::Options;
use settlewatch::engine::{Pipeline, PipelineSummary};
use settlewatch::errors::{Result, WatchError};
use settlewatch::fs::mock::MockFileSystem;
use settlewatch::types::{EventMask, RawEvent};
use settlewatch::watch::{NotifierMessage, WatchExpander};

use crate::fake_registrar::FakeRegistrar;
use crate::fake_runner::FakeRunner;
use crate::sink::SharedBuffer;

/// A running pipeline fed by hand instead of by the OS notifier.
///
/// - events go in through [`PipelineHarness::emit`]
/// - output lands in a [`SharedBuffer`]
/// - watches are recorded by a [`FakeRegistrar`]
/// - commands are recorded by a [`FakeRunner`]
pub struct PipelineHarness {
    pub fs: MockFileSystem,
    pub registrar: FakeRegistrar,
    pub runner: FakeRunner,
    pub out: SharedBuffer,
    source: Option<mpsc::UnboundedSender<NotifierMessage>>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<PipelineSummary>>,
}

impl PipelineHarness {
    pub fn start(options: Options) -> Self {
        Self::start_with(options, MockFileSystem::new(), FakeRegistrar::new(), FakeRunner::new())
    }

    /// Register `options.directories` as the initial watches and start the
    /// pipeline on a background task.
    pub fn start_with(
        options: Options,
        fs: MockFileSystem,
        registrar: FakeRegistrar,
        runner: FakeRunner,
    ) -> Self {
        let mut expander = WatchExpander::new(registrar.clone(), options.subdirs);
        expander
            .watch_initial(&options.directories)
            .expect("initial watches");

        let out = SharedBuffer::new();
        let (source_tx, source_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let pipeline = Pipeline::new(options, expander, Arc::new(fs.clone()));
        let sink = out.clone();
        let boxed_runner = Box::new(runner.clone());
        let handle = tokio::spawn(async move {
            pipeline
                .run(source_rx, boxed_runner, sink, async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Self {
            fs,
            registrar,
            runner,
            out,
            source: Some(source_tx),
            shutdown: Some(shutdown_tx),
            handle,
        }
    }

    /// Feed one notification, stamped now.
    pub fn emit(&self, path: &str, kinds: EventMask) {
        self.send(NotifierMessage::Event(RawEvent::new(path, kinds)));
    }

    pub fn emit_error(&self, err: WatchError) {
        self.send(NotifierMessage::Error(err));
    }

    /// Drop the notifier side of the channel, as if the OS watcher died.
    pub fn close_notifier(&mut self) {
        self.source = None;
    }

    pub fn output(&self) -> String {
        self.out.contents()
    }

    /// Request shutdown and wait for every stage to stop.
    pub async fn shutdown(mut self) -> Result<PipelineSummary> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.join().await
    }

    /// Wait for the pipeline to stop on its own (fatal error or sink failure).
    pub async fn join(self) -> Result<PipelineSummary> {
        self.handle.await.expect("pipeline task panicked")
    }

    fn send(&self, msg: NotifierMessage) {
        self.source
            .as_ref()
            .expect("notifier already closed")
            .send(msg)
            .expect("pipeline stopped listening");
    }
}

/// Let virtual time pass (tests run with a paused clock).
pub async fn advance(by: Duration) {
    tokio::time::sleep(by).await;
}
