//! Variable-width slab allocator over [`Body`] storage (spec §4.E).
//!
//! A slab's link is its byte offset in the body file directly (there
//! is no fixed record width to divide by), so `allocate` is a thin
//! wrapper over `Body::reserve` and `get`/`get_mut` hand back a view
//! starting exactly at that offset. Slab size is carried out-of-band
//! by the caller (typically a previously-written length-prefixed
//! `puts` record or a fixed wrapper record), matching the archive
//! tables that use slabs for variable-length transaction/input/output
//! payloads.

use crate::error::Result;
use crate::link::{self, LinkValue};
use crate::storage::{Accessor, Body, MutAccessor};

/// Allocates and addresses variable-width byte regions in a body file.
pub struct SlabManager;

impl SlabManager {
    /// Reserves `size` bytes and returns the link (byte offset) of the
    /// new slab. Fails with [`crate::error::Error::Eof`] if the
    /// resulting offset would not fit in a link of `link_width` bytes.
    pub fn allocate(&self, body: &Body, size: u64, link_width: usize) -> Result<LinkValue> {
        let offset = body.reserve(size)?;
        let last = offset + size.saturating_sub(1);
        link::checked(last, link_width)?;
        Ok(offset)
    }

    /// Read-only access to `size` bytes of the slab at `link`.
    pub fn get(&self, body: &Body, link: LinkValue) -> Result<Accessor<'_>> {
        body.access(link)
    }

    /// Mutable access to `size` bytes of the slab at `link`.
    pub fn get_mut(&self, body: &Body, link: LinkValue, size: usize) -> Result<MutAccessor<'_>> {
        body.access_mut(link, size)
    }
}

#[cfg(test)]
mod slab_manager_tests {
    use super::*;
    use crate::settings::GrowthRate;

    #[test]
    fn differently_sized_slabs_do_not_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("s.body"), 8, 50 as GrowthRate).unwrap();
        let manager = SlabManager;
        let a = manager.allocate(&body, 3, 4).unwrap();
        let b = manager.allocate(&body, 5, 4).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 3);
        manager
            .get_mut(&body, a, 3)
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[1, 2, 3]);
        manager
            .get_mut(&body, b, 5)
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[4, 5, 6, 7, 8]);
        assert_eq!(manager.get(&body, a).unwrap().as_slice(3), &[1, 2, 3]);
        assert_eq!(manager.get(&body, b).unwrap().as_slice(5), &[4, 5, 6, 7, 8]);
    }

    #[test]
    fn allocate_past_link_width_limit_returns_eof() {
        let dir = tempfile::tempdir().unwrap();
        let body = Body::create(dir.path().join("s.body"), 8, 50 as GrowthRate).unwrap();
        let manager = SlabManager;
        // 1-byte link width: only byte offsets 0..=254 are addressable.
        manager.allocate(&body, 200, 1).unwrap();
        assert!(matches!(
            manager.allocate(&body, 100, 1),
            Err(crate::error::Error::Eof)
        ));
    }
}
