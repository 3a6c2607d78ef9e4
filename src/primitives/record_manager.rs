//! Fixed-width record allocator over [`Body`] storage (spec §4.E).
//!
//! Every record is `record_size` bytes; a link is simply the record's
//! zero-based position, so converting a link to a byte offset is a
//! multiply. Allocation only ever appends: there is no free list,
//! matching the engine's append-only design.

use crate::error::Result;
use crate::link::{self, LinkValue};
use crate::storage::{Accessor, Body, MutAccessor};

/// Allocates and addresses fixed-width records in a body file.
pub struct RecordManager {
    record_size: usize,
    link_width: usize,
}

impl RecordManager {
    /// Builds a manager for records of `record_size` bytes, whose links
    /// are addressed with `link_width`-byte fields (used to reject an
    /// allocation whose resulting link would collide with the terminal
    /// sentinel for that width).
    #[must_use]
    pub fn new(record_size: usize, link_width: usize) -> Self {
        assert!(record_size > 0, "record size must be positive");
        Self { record_size, link_width }
    }

    /// Size in bytes of one record.
    #[must_use]
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Number of whole records currently logical in `body`.
    #[must_use]
    pub fn count(&self, body: &Body) -> u64 {
        body.logical() / self.record_size as u64
    }

    /// Reserves `count` consecutive records and returns the link of the
    /// first one. Fails with [`crate::error::Error::Eof`] if the link of
    /// the *last* reserved record would not fit in this manager's link
    /// width.
    pub fn allocate(&self, body: &Body, count: u64) -> Result<LinkValue> {
        let offset = body.reserve(count * self.record_size as u64)?;
        let first = offset / self.record_size as u64;
        let last = first + count.saturating_sub(1);
        link::checked(last, self.link_width)?;
        Ok(first)
    }

    /// Read-only access to the record at `link`.
    pub fn get(&self, body: &Body, link: LinkValue) -> Result<Accessor<'_>> {
        body.access(link * self.record_size as u64)
    }

    /// Mutable access to the record at `link`.
    pub fn get_mut(&self, body: &Body, link: LinkValue) -> Result<MutAccessor<'_>> {
        body.access_mut(link * self.record_size as u64, self.record_size)
    }
}

#[cfg(test)]
mod record_manager_tests {
    use super::*;
    use crate::settings::GrowthRate;

    #[test]
    fn allocate_returns_sequential_links() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("r.body"), 8, 50 as GrowthRate).unwrap();
        let manager = RecordManager::new(16, 4);
        let a = manager.allocate(&body, 1).unwrap();
        let b = manager.allocate(&body, 1).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("r.body"), 8, 50 as GrowthRate).unwrap();
        let manager = RecordManager::new(8, 4);
        let link = manager.allocate(&body, 1).unwrap();
        manager
            .get_mut(&body, link)
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[9, 8, 7, 6, 5, 4, 3, 2]);
        let read = manager.get(&body, link).unwrap();
        assert_eq!(read.as_slice(8), &[9, 8, 7, 6, 5, 4, 3, 2]);
    }

    #[test]
    fn allocate_past_link_width_limit_returns_eof() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("r.body"), 8, 50 as GrowthRate).unwrap();
        // 1-byte link width: only indices 0..=254 are representable
        // (255 is the terminal sentinel).
        let manager = RecordManager::new(4, 1);
        for _ in 0..255 {
            manager.allocate(&body, 1).unwrap();
        }
        assert!(matches!(
            manager.allocate(&body, 1),
            Err(crate::error::Error::Eof)
        ));
    }
}
