// src/watch/walk.rs

//! Enumerating the initial set of directories to watch.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::watch::filter::PathFilter;

/// Directories to register before the pipeline starts.
///
/// Without `subdirs` this is just `roots`. With `subdirs` every root is
/// walked and each directory below it is included, except:
/// - directories matching the exclusion pattern (and everything under them),
/// - directories that could not be read,
/// - on Unix, directories containing a named pipe.
///
/// Order follows the walk (parents before children).
pub fn directories_to_watch(roots: &[PathBuf], subdirs: bool, filter: &PathFilter) -> Vec<PathBuf> {
    if !subdirs {
        return roots.to_vec();
    }

    let mut found = Vec::new();
    let mut bad: HashSet<PathBuf> = HashSet::new();

    for root in roots {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.file_type().is_dir() && filter.is_excluded(entry.path()) {
                    debug!(path = ?entry.path(), "excluding directory from watch");
                    return false;
                }
                true
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable path while enumerating directories");
                    if let Some(path) = err.path() {
                        if err.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::NotFound)
                            || path.is_dir()
                        {
                            bad.insert(path.to_path_buf());
                        }
                    }
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                found.push(entry.path().to_path_buf());
            } else if is_named_pipe(&file_type) {
                if let Some(parent) = entry.path().parent() {
                    warn!(
                        pipe = ?entry.path(),
                        dir = ?parent,
                        "named pipe found; not watching its directory"
                    );
                    bad.insert(parent.to_path_buf());
                }
            }
        }
    }

    found.retain(|dir| !bad.contains(dir));
    found
}

#[cfg(unix)]
fn is_named_pipe(file_type: &std::fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_fifo()
}

#[cfg(not(unix))]
fn is_named_pipe(_file_type: &std::fs::FileType) -> bool {
    false
}
