use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use settlewatch::errors::WatchError;
use settlewatch::watch::WatchRegistrar;

/// How a registration should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    /// The OS watch budget is exhausted (fatal).
    Limit,
    /// The directory vanished before it could be watched.
    Gone,
    /// Any other refusal.
    Refused,
}

/// A fake registrar that:
/// - records every directory it was asked to watch, in order
/// - fails for directories configured with [`FakeRegistrar::fail_on`].
///
/// Clones share state, so a test can keep one handle while the pipeline owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct FakeRegistrar {
    added: Arc<Mutex<Vec<PathBuf>>>,
    failures: Arc<Mutex<HashMap<PathBuf, FakeFailure>>>,
}

impl FakeRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, dir: impl Into<PathBuf>, failure: FakeFailure) {
        self.failures.lock().unwrap().insert(dir.into(), failure);
    }

    /// Directories successfully registered so far.
    pub fn added(&self) -> Vec<PathBuf> {
        self.added.lock().unwrap().clone()
    }
}

impl WatchRegistrar for FakeRegistrar {
    fn add_watch(&mut self, dir: &Path) -> Result<(), WatchError> {
        let failure = self.failures.lock().unwrap().get(dir).copied();
        match failure {
            Some(FakeFailure::Limit) => Err(WatchError::LimitReached {
                path: dir.to_path_buf(),
                message: "no space left on device".to_string(),
            }),
            Some(FakeFailure::Gone) => Err(WatchError::PathGone(dir.to_path_buf())),
            Some(FakeFailure::Refused) => Err(WatchError::Failed {
                path: dir.to_path_buf(),
                message: "permission denied".to_string(),
            }),
            None => {
                self.added.lock().unwrap().push(dir.to_path_buf());
                Ok(())
            }
        }
    }
}
