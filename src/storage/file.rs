//! File and memory map primitive (spec §4.A).
//!
//! Owns exactly one OS file and, when loaded, one memory mapping over
//! it. `resize` grows the underlying file and remaps; callers above
//! this layer (`storage::body::Body`) are responsible for holding the
//! exclusive remap lock across the call so that no accessor observes
//! a torn mapping.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// A single memory-mapped file.
pub struct MappedFile {
    path: PathBuf,
    file: Option<File>,
    mmap: Option<MmapMut>,
}

impl MappedFile {
    /// Builds a handle for `path` without touching the filesystem.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            file: None,
            mmap: None,
        }
    }

    /// Path this file is backed by.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file (truncating any existing contents) and maps it
    /// at `initial_size` bytes.
    pub fn create(&mut self, initial_size: u64) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|_| Error::CreateFile)?;
        file.set_len(initial_size.max(1)).map_err(|_| Error::CreateFile)?;
        debug!(path = %self.path.display(), size = initial_size, "created mapped file");
        self.file = Some(file);
        self.map()?;
        Ok(())
    }

    /// Opens an existing file and maps it at its current size.
    pub fn open(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file.set_len(1)?;
        }
        self.file = Some(file);
        self.map()?;
        Ok(())
    }

    /// Maps (or remaps) the currently open file at its current length.
    fn map(&mut self) -> Result<()> {
        let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
        // SAFETY: `file` is open for read/write and outlives the mapping
        // (it is stored alongside `mmap` in the same struct and dropped
        // only after `unmap`/`Drop` releases the mapping first).
        let mmap = unsafe { MmapMut::map_mut(file)? };
        self.mmap = Some(mmap);
        Ok(())
    }

    /// Unmaps without closing the underlying file descriptor.
    pub fn unmap(&mut self) {
        self.mmap = None;
    }

    /// Closes the file, dropping any live mapping first.
    pub fn close(&mut self) {
        self.unmap();
        self.file = None;
    }

    /// Removes the file from disk. The handle must already be closed.
    pub fn remove(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Renames (moves) a file or directory from `from` to `to`.
    pub fn rename(from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to)?;
        Ok(())
    }

    /// True if `path` exists and is a directory.
    #[must_use]
    pub fn is_directory(path: &Path) -> bool {
        path.is_dir()
    }

    /// Removes every entry under `dir` but leaves `dir` itself in place.
    pub fn clear_directory(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|_| Error::CreateDirectory)?;
            return Ok(());
        }
        for entry in fs::read_dir(dir).map_err(|_| Error::ClearDirectory)? {
            let entry = entry.map_err(|_| Error::ClearDirectory)?;
            let path = entry.path();
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(|_| Error::ClearDirectory)?;
            } else {
                fs::remove_file(&path).map_err(|_| Error::ClearDirectory)?;
            }
        }
        trace!(dir = %dir.display(), "cleared directory");
        Ok(())
    }

    /// Current logical file size on disk (not the mapping length).
    pub fn size(&self) -> Result<u64> {
        let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
        Ok(file.metadata()?.len())
    }

    /// Flushes the mapping's dirty pages to disk.
    pub fn flush(&self) -> Result<()> {
        if let Some(mmap) = &self.mmap {
            mmap.flush()?;
        }
        Ok(())
    }

    /// Extends the file to `new_size` bytes and remaps it. Shrinking is
    /// never requested by this engine's growth path and is rejected;
    /// use [`Self::truncate`] for the restore path, which legitimately
    /// shrinks a body back to its last-snapshotted logical size.
    pub fn resize(&mut self, new_size: u64) -> Result<()> {
        let current = self.size()?;
        if new_size < current {
            return Err(Error::CreateFile);
        }
        if new_size == current && self.mmap.is_some() {
            return Ok(());
        }
        self.flush()?;
        let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
        file.set_len(new_size)?;
        self.map()?;
        debug!(path = %self.path.display(), from = current, to = new_size, "remapped file");
        Ok(())
    }

    /// Shrinks (or grows) the file to exactly `new_size` bytes and
    /// remaps it. Used only by `restore` to discard unflushed growth
    /// headroom left behind by a crash.
    pub fn truncate(&mut self, new_size: u64) -> Result<()> {
        self.flush()?;
        let file = self.file.as_ref().ok_or(Error::UnloadedFile)?;
        file.set_len(new_size.max(1))?;
        self.map()?;
        debug!(path = %self.path.display(), to = new_size, "truncated file");
        Ok(())
    }

    /// Raw immutable pointer to the start of the mapping.
    ///
    /// # Panics
    ///
    /// Panics if the file is not currently mapped.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ref().expect("file not mapped").as_ptr()
    }

    /// Raw mutable pointer to the start of the mapping.
    ///
    /// # Safety
    ///
    /// Callers must only write ranges they have exclusively allocated
    /// via a record/slab manager; the mapping itself does not enforce
    /// mutual exclusion between writers.
    ///
    /// # Panics
    ///
    /// Panics if the file is not currently mapped.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.mmap.as_mut().expect("file not mapped").as_mut_ptr()
    }

    /// Length in bytes of the current mapping (the physical file size).
    #[must_use]
    pub fn mapped_len(&self) -> usize {
        self.mmap.as_ref().map_or(0, MmapMut::len)
    }

    /// True if this file currently has a live mapping.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.mmap.is_some()
    }
}

impl Drop for MappedFile {
    fn drop(&mut self) {
        if let Some(mmap) = &self.mmap {
            if let Err(error) = mmap.flush() {
                tracing::error!(?error, path = %self.path.display(), "failed to flush mapping on drop");
            }
        }
    }
}
