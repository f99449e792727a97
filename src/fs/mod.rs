// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::Path;

use crate::types::FileMeta;

pub mod mock;

/// Abstract filesystem interface.
///
/// The pipeline only ever needs to `stat` a path, once per ingested event.
pub trait FileSystem: Send + Sync + Debug {
    /// Size and kind of `path`, following symlinks.
    ///
    /// A vanished path must be reported as `io::ErrorKind::NotFound`.
    fn stat(&self, path: &Path) -> io::Result<FileMeta>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn stat(&self, path: &Path) -> io::Result<FileMeta> {
        let meta = fs::metadata(path)?;
        Ok(FileMeta {
            size: meta.len(),
            is_dir: meta.is_dir(),
        })
    }
}
