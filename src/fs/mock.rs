// src/fs/mock.rs

use super::FileSystem;
use crate::types::FileMeta;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(u64), // size in bytes
    Dir,
    /// `stat` fails with this error kind.
    Broken(io::ErrorKind),
}

/// In-memory filesystem for tests. Clones share the same entries, so a test
/// can keep a handle and mutate the tree while the pipeline is running.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) {
        self.insert(path.as_ref(), MockEntry::File(size));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Dir);
    }

    pub fn add_broken(&self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        self.insert(path.as_ref(), MockEntry::Broken(kind));
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(path.as_ref());
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let mut entries = self.entries.lock().unwrap();
        // Parents exist implicitly so tests only declare what they touch.
        let mut parent = path.parent();
        while let Some(dir) = parent {
            if dir.as_os_str().is_empty() {
                break;
            }
            entries.entry(dir.to_path_buf()).or_insert(MockEntry::Dir);
            parent = dir.parent();
        }
        entries.insert(path.to_path_buf(), entry);
    }
}

impl FileSystem for MockFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File(size)) => Ok(FileMeta {
                size: *size,
                is_dir: false,
            }),
            Some(MockEntry::Dir) => Ok(FileMeta {
                size: 0,
                is_dir: true,
            }),
            Some(MockEntry::Broken(kind)) => Err(io::Error::new(
                *kind,
                format!("mock stat failure for {:?}", path),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file or directory: {:?}", path),
            )),
        }
    }
}
