//! Growable, memory-mapped body storage (spec §4.B).
//!
//! The body file holds the actual record/slab bytes a table manages.
//! It grows by a configured percentage headroom whenever a `reserve`
//! would overrun the current mapping, and the single `RwLock` guarding
//! the mapping is the concurrency pivot for the whole engine: every
//! read or write access takes it shared (any number of accessors may
//! run concurrently), while growing the file and remapping takes it
//! exclusive, which blocks until every outstanding [`Accessor`] and
//! [`MutAccessor`] has been dropped.
//!
//! The logical size (bytes actually in use) is tracked separately from
//! the physical mapping size (which includes growth headroom) via an
//! atomic counter so that allocators can claim a range with a single
//! `fetch_add` before ever taking the remap lock.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::accessor::{Accessor, MutAccessor};
use super::file::MappedFile;
use crate::error::Result;
use crate::settings::GrowthRate;

/// Growable body storage backing one table's record or slab bytes.
pub struct Body {
    mapping: RwLock<MappedFile>,
    logical: AtomicU64,
    rate: GrowthRate,
}

impl Body {
    /// Creates a new body file at `path` with `initial_size` bytes of
    /// physical capacity and a logical size of zero.
    pub fn create(path: impl Into<PathBuf>, initial_size: u64, rate: GrowthRate) -> Result<Self> {
        let mut file = MappedFile::new(path.into());
        file.create(initial_size.max(1))?;
        Ok(Self {
            mapping: RwLock::new(file),
            logical: AtomicU64::new(0),
            rate,
        })
    }

    /// Opens an existing body file, trusting `logical_size` as the
    /// previously persisted logical size (the physical mapping may be
    /// larger due to unconsumed growth headroom).
    pub fn open(path: impl Into<PathBuf>, logical_size: u64, rate: GrowthRate) -> Result<Self> {
        let mut file = MappedFile::new(path.into());
        file.open()?;
        Ok(Self {
            mapping: RwLock::new(file),
            logical: AtomicU64::new(logical_size),
            rate,
        })
    }

    /// Bytes of the mapping actually in use.
    #[must_use]
    pub fn logical(&self) -> u64 {
        self.logical.load(Ordering::Acquire)
    }

    /// Path of the underlying body file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.mapping.read().path().to_path_buf()
    }

    /// Current physical mapping size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.mapping.read().mapped_len()
    }

    /// Grows the mapping, if needed, so that `logical() + additional`
    /// bytes fit, applying the configured growth rate as headroom, then
    /// advances the logical size and returns the offset the caller may
    /// write `additional` bytes at.
    pub fn reserve(&self, additional: u64) -> Result<u64> {
        let offset = self.logical.fetch_add(additional, Ordering::AcqRel);
        let required = offset + additional;
        if required as usize > self.capacity() {
            let mut file = self.mapping.write();
            if required as usize > file.mapped_len() {
                let headroom = required * u64::from(self.rate) / 100;
                let new_size = (required + headroom).max(required);
                file.resize(new_size)?;
            }
        }
        Ok(offset)
    }

    /// Read-only access to `size` bytes at `offset`, under the shared
    /// remap lock.
    pub fn access(&self, offset: u64) -> Result<Accessor<'_>> {
        let guard = self.mapping.read();
        Ok(Accessor::new(guard, offset as usize))
    }

    /// Mutable access to `size` bytes at `offset`, under the shared
    /// remap lock. Callers must have exclusively reserved `[offset,
    /// offset + size)` beforehand (via `reserve`), since `size` bytes
    /// of concurrent mutable access are not otherwise arbitrated.
    pub fn access_mut(&self, offset: u64, size: usize) -> Result<MutAccessor<'_>> {
        let guard = self.mapping.read();
        Ok(MutAccessor::new(guard, offset as usize, size))
    }

    /// Flushes dirty pages to disk.
    pub fn flush(&self) -> Result<()> {
        self.mapping.read().flush()
    }

    /// Unloads the mapping (used by `Store::close`); the file handle is
    /// retained for re-mapping by `load`.
    pub fn unload(&self) {
        self.mapping.write().unmap();
    }

    /// Resets the in-memory logical size counter, e.g. to the value
    /// recorded in a table's head after `restore` rewinds it.
    pub fn reset_logical(&self, value: u64) {
        self.logical.store(value, Ordering::Release);
    }

    /// Shrinks the logical size by `by` bytes without touching the
    /// physical mapping. Used by the `candidate`/`confirmed` positional
    /// tables' `pop`, the one place this engine legitimately retreats
    /// its logical size outside of `restore` — the body invariant only
    /// requires monotonicity *between snapshots*, and a pop followed by
    /// a fresh push simply reuses the vacated tail.
    ///
    /// # Panics
    ///
    /// Panics if `by` exceeds the current logical size.
    pub fn shrink_logical(&self, by: u64) {
        self.logical
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_sub(by)
            })
            .expect("shrink_logical underflow");
    }

    /// Truncates the physical file down to exactly the logical size.
    /// Used by `restore` to drop unflushed growth headroom left behind
    /// by a crash.
    pub fn truncate_to_logical(&self) -> Result<()> {
        let mut file = self.mapping.write();
        let logical = self.logical.load(Ordering::Acquire);
        file.truncate(logical)?;
        Ok(())
    }

    /// Removes the body file from disk. The body must already be closed.
    pub fn remove(path: &Path) -> Result<()> {
        MappedFile::remove(path)
    }
}
