//! Modification-time tracking for a single source file.
//!
//! A [`WatchedFile`] remembers the last modification time it observed and
//! reports whether the file on disk has moved on since then. The cache uses
//! it to decide when a compiled artifact has gone stale.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Observes one file's modification time.
///
/// The stored baseline only advances when [`has_changed`](Self::has_changed)
/// reports a change, so repeated calls without an intervening modification
/// return `false`.
#[derive(Debug, Clone)]
pub struct WatchedFile {
    /// Canonical path of the watched file
    path: PathBuf,
    /// Last observed modification time; `None` once marked dirty
    last_modified: Option<SystemTime>,
}

impl WatchedFile {
    /// Start watching the file at `path`.
    ///
    /// The path is canonicalized and its current modification time becomes
    /// the baseline.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be stat'ed.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = fs::canonicalize(path.as_ref())?;
        let last_modified = modified_time(&path)?;
        Ok(Self {
            path,
            last_modified: Some(last_modified),
        })
    }

    /// Canonical path of the watched file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the file was modified since the last observation.
    ///
    /// On a change the baseline is updated before returning, so an immediate
    /// second call returns `false`.
    pub fn has_changed(&mut self) -> io::Result<bool> {
        let current = modified_time(&self.path)?;
        if self.last_modified == Some(current) {
            return Ok(false);
        }
        self.last_modified = Some(current);
        Ok(true)
    }

    /// Force the next [`has_changed`](Self::has_changed) call to return true.
    ///
    /// Does not touch the filesystem.
    pub fn mark_dirty(&mut self) {
        self.last_modified = None;
    }

    /// Returns true if `other` refers to the same file as this watcher.
    ///
    /// Both sides are compared by canonical path, so symlinks and relative
    /// spellings resolve to the same identity.
    pub fn same_file(&self, other: impl AsRef<Path>) -> io::Result<bool> {
        Ok(fs::canonicalize(other.as_ref())? == self.path)
    }
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}
