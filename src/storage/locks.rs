//! Process-wide and flush-intent advisory file locks (spec §4.D).
//!
//! Both locks are plain files under the store root, locked via `fs2`'s
//! OS-level advisory locking so a second process opening the same
//! store directory fails fast instead of corrupting it. The flush lock
//! additionally serves as the crash marker: if it is found still held
//! (or, on a non-crashed clean open, simply present and lockable) when
//! a store is opened, `Store::open` treats that as evidence of an
//! unclean prior shutdown and requires `restore` first.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

/// A single advisory-locked marker file.
pub struct FileLock {
    path: PathBuf,
    file: Option<File>,
}

impl FileLock {
    /// Builds a handle for the lock file at `path` without acquiring it.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    /// True if the marker file currently exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of the marker file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_file(&self) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&self.path)
            .map_err(Error::Io)
    }

    /// Takes an exclusive advisory lock, creating the marker file if it
    /// does not yet exist. Fails immediately if another process already
    /// holds it (never blocks).
    pub fn try_lock_exclusive(&mut self, on_fail: fn() -> Error) -> Result<()> {
        let file = self.open_file()?;
        file.try_lock_exclusive().map_err(|_| on_fail())?;
        self.file = Some(file);
        Ok(())
    }

    /// Releases the lock and removes the marker file.
    pub fn unlock_and_remove(&mut self, on_fail: fn() -> Error) -> Result<()> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|_| on_fail())?;
            drop(file);
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Releases the lock without removing the marker file (used by the
    /// flush lock, whose on-disk presence is the crash signal).
    pub fn unlock(&mut self, on_fail: fn() -> Error) -> Result<()> {
        if let Some(file) = self.file.take() {
            FileExt::unlock(&file).map_err(|_| on_fail())?;
        }
        Ok(())
    }
}

/// Process-wide advisory lock: held for the entire lifetime of an open
/// store, preventing a second process from opening the same directory.
pub struct ProcessLock(FileLock);

impl ProcessLock {
    /// Builds a handle for `process.lock` under `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self(FileLock::new(dir.join("process.lock")))
    }

    /// Acquires the lock.
    pub fn lock(&mut self) -> Result<()> {
        self.0.try_lock_exclusive(|| Error::ProcessLock)
    }

    /// Releases the lock and removes the marker.
    pub fn unlock(&mut self) -> Result<()> {
        self.0.unlock_and_remove(|| Error::ProcessUnlock)
    }
}

/// Flush-intent advisory lock: held only while a `backup`/`close` flush
/// is in flight. Its on-disk presence at the next `open` is evidence
/// the previous session crashed mid-flush and `restore` is required.
pub struct FlushLock(FileLock);

impl FlushLock {
    /// Builds a handle for `flush.lock` under `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self(FileLock::new(dir.join("flush.lock")))
    }

    /// True if the flush marker exists, i.e. the previous session did
    /// not shut down cleanly.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.exists()
    }

    /// Acquires the lock, marking a flush as in flight.
    pub fn lock(&mut self) -> Result<()> {
        self.0.try_lock_exclusive(|| Error::FlushLock)
    }

    /// Releases the OS lock without removing the marker file: the
    /// marker's on-disk presence must survive an unsnapshotted close so
    /// the next `open` can detect it and require `restore`. Only
    /// `restore` itself rotates (removes and recreates) the marker.
    pub fn unlock(&mut self) -> Result<()> {
        self.0.unlock(|| Error::FlushUnlock)
    }

    /// Removes the marker file outright. Called by `restore` once the
    /// crash it signaled has been repaired, so a subsequent clean
    /// session starts without a stale marker.
    pub fn remove(&mut self) -> Result<()> {
        self.0.unlock_and_remove(|| Error::FlushUnlock)
    }
}

#[cfg(test)]
mod locks_tests {
    use super::*;

    #[test]
    fn process_lock_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = ProcessLock::new(dir.path());
        lock.lock().unwrap();
        assert!(dir.path().join("process.lock").exists());
        lock.unlock().unwrap();
        assert!(!dir.path().join("process.lock").exists());
    }

    #[test]
    fn flush_lock_marker_survives_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = FlushLock::new(dir.path());
        assert!(!lock.is_set());
        lock.lock().unwrap();
        assert!(lock.is_set());
        lock.unlock().unwrap();
        assert!(lock.is_set(), "unlock releases the OS lock but must not erase the crash marker");
    }

    #[test]
    fn flush_lock_remove_clears_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = FlushLock::new(dir.path());
        lock.lock().unwrap();
        lock.unlock().unwrap();
        lock.remove().unwrap();
        assert!(!lock.is_set());
    }
}
