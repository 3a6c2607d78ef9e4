//! Positional arraymap: direct-indexed, no bucketing or chaining
//! (spec §4.G).
//!
//! Used for the dense-prefix `candidate`/`confirmed` chain tables and
//! for other positionally-addressed data. A read past the current
//! logical end of the array is not an error: it returns an "exhausted"
//! reader whose fields all read back as zero, mirroring a table that
//! has reserved space for a position but not yet written it.
//!
//! `pop` retreats the body's logical size by one record via
//! `Body::shrink_logical`. The body invariant only requires
//! monotonicity *between snapshots*, so a pop followed by a fresh
//! `push` simply reuses the vacated tail position.

use crate::error::Result;
use crate::link::LinkValue;
use crate::primitives::record_manager::RecordManager;
use crate::storage::Body;

/// A positional, fixed-width array over a body file.
pub struct Arraymap {
    records: RecordManager,
}

impl Arraymap {
    /// Builds an arraymap of `record_size`-byte elements, whose
    /// positions are addressed with `link_width`-byte link fields.
    #[must_use]
    pub fn new(record_size: usize, link_width: usize) -> Self {
        Self {
            records: RecordManager::new(record_size, link_width),
        }
    }

    /// Number of populated positions.
    #[must_use]
    pub fn count(&self, body: &Body) -> u64 {
        self.records.count(body)
    }

    /// Appends one element at the next position and returns its index.
    pub fn push(&self, body: &Body, record: &[u8]) -> Result<LinkValue> {
        assert_eq!(record.len(), self.records.record_size(), "record size mismatch");
        let link = self.records.allocate(body, 1)?;
        self.records
            .get_mut(body, link)?
            .as_mut_slice()
            .copy_from_slice(record);
        Ok(link)
    }

    /// Removes the last populated position. The bytes themselves are
    /// left in place and are overwritten by the next `push`.
    ///
    /// # Panics
    ///
    /// Panics if the array is empty.
    pub fn pop(&self, body: &Body) {
        assert!(self.count(body) > 0, "pop on empty arraymap");
        body.shrink_logical(self.records.record_size() as u64);
    }

    /// Writes `record` at `position`, padding with zero-valued records
    /// up to `position` first if the array's current count doesn't
    /// reach it yet. Used by the foreign-keyed caches (`buffer`,
    /// `neutrino`), which are positional by another table's link rather
    /// than by insertion order, so writes can legitimately target a
    /// position past the current tail. Extending a memory-mapped file
    /// zero-fills the new region, so the padding reads back exhausted
    /// exactly like an unwritten tail position until overwritten.
    pub fn set(&self, body: &Body, position: LinkValue, record: &[u8]) -> Result<()> {
        assert_eq!(record.len(), self.records.record_size(), "record size mismatch");
        let current = self.count(body);
        if position >= current {
            self.records.allocate(body, position - current + 1)?;
        }
        self.records.get_mut(body, position)?.as_mut_slice().copy_from_slice(record);
        Ok(())
    }

    /// Reads the element at `position`. Returns an exhausted reader
    /// (all-zero bytes) if `position` is at or past the current count.
    pub fn get(&self, body: &Body, position: LinkValue) -> Result<ArrayReader> {
        if position < self.count(body) {
            let accessor = self.records.get(body, position)?;
            Ok(ArrayReader::Present {
                bytes: accessor.as_slice(self.records.record_size()).to_vec(),
            })
        } else {
            Ok(ArrayReader::Exhausted {
                size: self.records.record_size(),
            })
        }
    }
}

/// A read view over one arraymap position.
pub enum ArrayReader {
    /// The position is within the current count.
    Present {
        /// Copied element bytes.
        bytes: Vec<u8>,
    },
    /// The position is past the current count; every field reads zero.
    Exhausted {
        /// Element width, so zero-fill has the right length.
        size: usize,
    },
}

impl ArrayReader {
    /// True if this read landed past the array's current end.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, ArrayReader::Exhausted { .. })
    }

    /// The element bytes, zero-filled if exhausted.
    #[must_use]
    pub fn bytes(&self) -> std::borrow::Cow<'_, [u8]> {
        match self {
            ArrayReader::Present { bytes } => std::borrow::Cow::Borrowed(bytes),
            ArrayReader::Exhausted { size } => std::borrow::Cow::Owned(vec![0u8; *size]),
        }
    }
}
