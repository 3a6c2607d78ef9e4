//! Fixed-size, memory-mapped head storage (spec §4.C, §6).
//!
//! Unlike [`Body`](super::body::Body), a head file never grows after
//! creation: it holds a 4-byte little-endian record of its owning
//! body's logical size at last snapshot, followed by the hashmap's
//! bucket array (zero buckets for an array table's head). Because its
//! size is invariant, no remap lock is needed; reads and writes are
//! arbitrated per-bucket by the caller (the hashmap only ever writes a
//! bucket's link after its chain node is durably committed, so a
//! racing reader sees either the old or the new link, never a torn
//! one).

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::link::{self, LinkValue};

use super::file::MappedFile;

/// Width, in bytes, of the logical-body-size prefix every head file
/// carries ahead of its bucket array.
const LOGICAL_SIZE_WIDTH: usize = 4;

/// Fixed-size bucket array backing a table's head file.
pub struct Head {
    file: MappedFile,
    link_width: usize,
    buckets: u32,
}

impl Head {
    /// Creates a new head file sized for `buckets` links of `link_width`
    /// bytes each (plus the logical-size prefix), every bucket
    /// initialized to the terminal sentinel and logical size to 0.
    pub fn create(path: impl Into<PathBuf>, buckets: u32, link_width: usize) -> Result<Self> {
        let mut file = MappedFile::new(path.into());
        let size = LOGICAL_SIZE_WIDTH as u64 + u64::from(buckets) * link_width as u64;
        file.create(size.max(1))?;
        let mut head = Self {
            file,
            link_width,
            buckets,
        };
        head.set_logical_size(0);
        let terminal = link::terminal(link_width);
        for bucket in 0..buckets {
            head.set(bucket, terminal);
        }
        Ok(head)
    }

    /// Opens an existing head file, trusting its on-disk size to match
    /// `4 + buckets * link_width`.
    pub fn open(path: impl Into<PathBuf>, buckets: u32, link_width: usize) -> Result<Self> {
        let mut file = MappedFile::new(path.into());
        file.open()?;
        Ok(Self {
            file,
            link_width,
            buckets,
        })
    }

    /// Number of buckets in this head.
    #[must_use]
    pub fn buckets(&self) -> u32 {
        self.buckets
    }

    /// The owning body's logical size as last recorded by `snap`.
    #[must_use]
    pub fn logical_size(&self) -> u32 {
        // SAFETY: every head is at least LOGICAL_SIZE_WIDTH bytes.
        let bytes = unsafe { std::slice::from_raw_parts(self.file.as_ptr(), LOGICAL_SIZE_WIDTH) };
        u32::from_le_bytes(bytes.try_into().unwrap())
    }

    /// Records the owning body's current logical size.
    pub fn set_logical_size(&mut self, size: u32) {
        // SAFETY: every head is at least LOGICAL_SIZE_WIDTH bytes.
        let bytes =
            unsafe { std::slice::from_raw_parts_mut(self.file.as_mut_ptr(), LOGICAL_SIZE_WIDTH) };
        bytes.copy_from_slice(&size.to_le_bytes());
    }

    /// Reads the link stored in `bucket`.
    ///
    /// # Panics
    ///
    /// Panics if `bucket >= buckets()`.
    #[must_use]
    pub fn get(&self, bucket: u32) -> LinkValue {
        assert!(bucket < self.buckets, "bucket index out of range");
        let offset = LOGICAL_SIZE_WIDTH + bucket as usize * self.link_width;
        // SAFETY: offset + link_width <= mapped_len, checked above via
        // the bucket bound (file sized as 4 + buckets * link_width).
        let bytes =
            unsafe { std::slice::from_raw_parts(self.file.as_ptr().add(offset), self.link_width) };
        link::read_le(bytes, self.link_width)
    }

    /// Overwrites the link stored in `bucket`.
    ///
    /// # Panics
    ///
    /// Panics if `bucket >= buckets()`.
    pub fn set(&mut self, bucket: u32, value: LinkValue) {
        assert!(bucket < self.buckets, "bucket index out of range");
        let offset = LOGICAL_SIZE_WIDTH + bucket as usize * self.link_width;
        let width = self.link_width;
        // SAFETY: offset + width <= mapped_len, as in `get`.
        let bytes =
            unsafe { std::slice::from_raw_parts_mut(self.file.as_mut_ptr().add(offset), width) };
        link::write_le(value, width, bytes);
    }

    /// Flushes dirty pages to disk.
    pub fn flush(&self) -> Result<()> {
        self.file.flush()
    }

    /// Unloads the mapping without closing the file descriptor.
    pub fn unload(&mut self) {
        self.file.unmap();
    }

    /// Path of the underlying head file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Removes the head file from disk.
    pub fn remove(path: &Path) -> Result<()> {
        MappedFile::remove(path)
    }
}

#[cfg(test)]
mod head_tests {
    use super::*;

    #[test]
    fn new_buckets_start_terminal_and_logical_size_zero() {
        let dir = tempfile::tempdir().unwrap();
        let head = Head::create(dir.path().join("h.head"), 16, 4).unwrap();
        assert!(link::is_terminal(head.get(0), 4));
        assert!(link::is_terminal(head.get(15), 4));
        assert_eq!(head.logical_size(), 0);
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut head = Head::create(dir.path().join("h.head"), 16, 4).unwrap();
        head.set(3, 0x1122_3344);
        assert_eq!(head.get(3), 0x1122_3344);
        assert!(link::is_terminal(head.get(4), 4));
        head.set_logical_size(9000);
        assert_eq!(head.logical_size(), 9000);
        assert_eq!(head.get(3), 0x1122_3344);
    }

    #[test]
    #[should_panic(expected = "bucket index out of range")]
    fn get_out_of_range_panics() {
        let dir = tempfile::tempdir().unwrap();
        let head = Head::create(dir.path().join("h.head"), 4, 4).unwrap();
        head.get(4);
    }
}
