use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use settlewatch::errors::Result;
use settlewatch::exec::{CommandOutput, CommandRunner};

/// One recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub template: Vec<String>,
    pub paths: Vec<PathBuf>,
}

/// A fake runner that:
/// - records each invocation
/// - optionally sleeps (to model a slow command)
/// - reports success, or failure with exit code 1 when `failing` is set.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<Invocation>>>,
    delay: Option<Duration>,
    failing: bool,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run_command(
        &mut self,
        template: &[String],
        paths: &[PathBuf],
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutput>> + Send + '_>> {
        let invocation = Invocation {
            template: template.to_vec(),
            paths: paths.to_vec(),
        };
        let calls = Arc::clone(&self.calls);
        let delay = self.delay;
        let failing = self.failing;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            calls.lock().unwrap().push(invocation);
            Ok(CommandOutput {
                success: !failing,
                code: Some(if failing { 1 } else { 0 }),
                combined: if failing { b"boom\n".to_vec() } else { Vec::new() },
            })
        })
    }
}
