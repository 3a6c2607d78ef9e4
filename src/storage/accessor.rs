//! Zero-copy accessor for mapped storage (spec §4.B, "Accessor").
//!
//! An `Accessor` holds a shared (read) guard on a [`Body`](super::body::Body)'s
//! remap lock for its entire lifetime, so the pointer it exposes stays
//! valid even if another thread concurrently grows the file — growth
//! takes the lock exclusively and blocks until every outstanding
//! `Accessor` is dropped.

use parking_lot::RwLockReadGuard;

use super::file::MappedFile;

/// A pinned, read-only view into a mapped body file starting at a byte
/// offset. Borrowing through this type rather than a raw pointer keeps
/// the remap lock held for as long as the caller needs the bytes.
pub struct Accessor<'a> {
    _guard: RwLockReadGuard<'a, MappedFile>,
    base: *const u8,
    len: usize,
}

impl<'a> Accessor<'a> {
    pub(super) fn new(guard: RwLockReadGuard<'a, MappedFile>, offset: usize) -> Self {
        let len = guard.mapped_len().saturating_sub(offset);
        // SAFETY: `offset` is caller-validated to lie within the mapping
        // (checked by `Body::access`); the guard keeps the mapping alive
        // and stable for the lifetime of `self`.
        let base = unsafe { guard.as_ptr().add(offset) };
        Self {
            _guard: guard,
            base,
            len,
        }
    }

    /// Bytes available from the accessor's offset to the end of the
    /// current mapping.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the accessor's offset is at or past the current mapping.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows `size` bytes starting at the accessor's offset.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds the bytes available (`len`).
    #[must_use]
    pub fn as_slice(&self, size: usize) -> &[u8] {
        assert!(size <= self.len, "accessor read past mapped end");
        // SAFETY: `base` is valid for `self.len` bytes for the life of
        // the guard; `size <= self.len` was just checked.
        unsafe { std::slice::from_raw_parts(self.base, size) }
    }

    /// Raw pointer to the accessor's offset. Valid for `len()` bytes.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.base
    }
}

/// A pinned, mutable view into a mapped body file starting at a byte
/// offset. Constructed only over a range the caller has exclusively
/// allocated via a record or slab manager, so concurrent `MutAccessor`s
/// never overlap even though the remap lock is only held for read.
pub struct MutAccessor<'a> {
    _guard: RwLockReadGuard<'a, MappedFile>,
    base: *mut u8,
    len: usize,
}

impl<'a> MutAccessor<'a> {
    pub(super) fn new(guard: RwLockReadGuard<'a, MappedFile>, offset: usize, len: usize) -> Self {
        assert!(
            offset + len <= guard.mapped_len(),
            "mutable accessor range exceeds mapping"
        );
        // SAFETY: the mapping is `&mut`-aliasable only through pointers
        // handed out by a record/slab manager over disjoint ranges; the
        // guard keeps the mapping alive and stable for the lifetime of
        // `self`. `offset + len` was just bounds-checked.
        let base = unsafe { guard.as_ptr().add(offset).cast_mut() };
        Self {
            _guard: guard,
            base,
            len,
        }
    }

    /// Bytes available to this accessor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if this accessor spans zero bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Borrows the full mutable range as a byte slice.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: `base` is valid and exclusively owned by this accessor
        // for `len` bytes, per the allocation contract documented above.
        unsafe { std::slice::from_raw_parts_mut(self.base, self.len) }
    }

    /// Raw mutable pointer to the accessor's offset.
    #[must_use]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.base
    }
}

#[cfg(test)]
mod accessor_tests {
    use super::super::body::Body;
    use crate::settings::GrowthRate;

    #[test]
    fn accessor_reads_back_written_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("t.body"), 64, 50 as GrowthRate).unwrap();
        {
            let mut w = body.access_mut(0, 4).unwrap();
            w.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        }
        let r = body.access(0).unwrap();
        assert_eq!(&r.as_slice(4), &[1, 2, 3, 4]);
    }
}
