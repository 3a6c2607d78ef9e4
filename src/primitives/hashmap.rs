//! Chained hashmap: buckets in the head file, chain nodes in the body
//! file (spec §4.F).
//!
//! Each bucket holds the link of the newest chain node inserted under
//! it; each node holds the link of the node inserted before it (or the
//! terminal sentinel). Insertion therefore only ever prepends: `commit`
//! writes the new node's `next` field before it publishes the node's
//! link into the bucket slot, so a concurrent reader walking the chain
//! never observes a node whose `next` field isn't yet durable. There is
//! no deletion primitive; tables that need to revoke an association
//! overwrite a node's payload with a sentinel instead (see
//! `tables::strong_tx`).
//!
//! A node's on-disk layout is `[next: link_width][key: key_size]
//! [payload: payload_size]`.

use rustc_hash::FxHasher;
use std::hash::Hasher;

use crate::error::Result;
use crate::link::{self, LinkValue};
use crate::primitives::record_manager::RecordManager;
use crate::storage::{Accessor, Body, Head, MutAccessor};

/// A chained hashmap over one (head, body) file pair.
pub struct Hashmap {
    link_width: usize,
    key_size: usize,
    payload_size: usize,
    records: RecordManager,
}

impl Hashmap {
    /// Builds a hashmap descriptor. `link_width` sizes both the bucket
    /// slot and each node's `next` field.
    #[must_use]
    pub fn new(link_width: usize, key_size: usize, payload_size: usize) -> Self {
        let record_size = link_width + key_size + payload_size;
        Self {
            link_width,
            key_size,
            payload_size,
            records: RecordManager::new(record_size, link_width),
        }
    }

    fn bucket_of(&self, head: &Head, key: &[u8]) -> u32 {
        let mut hasher = FxHasher::default();
        hasher.write(key);
        (hasher.finish() % u64::from(head.buckets())) as u32
    }

    /// True if any node keyed by `key` exists in the chain.
    pub fn exists(&self, head: &Head, body: &Body, key: &[u8]) -> Result<bool> {
        Ok(self.first(head, body, key)?.is_some())
    }

    /// Link of the newest (first) node keyed by `key`, if any.
    pub fn first(&self, head: &Head, body: &Body, key: &[u8]) -> Result<Option<LinkValue>> {
        let mut iter = self.iter(head, body, key);
        iter.next().transpose()
    }

    /// Iterates every node's link keyed by `key`, newest first.
    #[must_use]
    pub fn iter<'a>(&'a self, head: &'a Head, body: &'a Body, key: &'a [u8]) -> ChainIter<'a> {
        let start = head.get(self.bucket_of(head, key));
        ChainIter {
            map: self,
            head,
            body,
            key,
            next: start,
        }
    }

    /// Reserves a new node (not yet linked into any bucket).
    pub fn allocate(&self, body: &Body) -> Result<LinkValue> {
        self.records.allocate(body, 1)
    }

    /// Writes `key` and `payload` into the node at `link`, sets its
    /// `next` field to the bucket's current head, then publishes `link`
    /// into the bucket. This is the only mutation path that grows a
    /// chain.
    pub fn commit(
        &self,
        head: &mut Head,
        body: &Body,
        link: LinkValue,
        key: &[u8],
        payload: &[u8],
    ) -> Result<()> {
        assert_eq!(key.len(), self.key_size, "key size mismatch");
        assert_eq!(payload.len(), self.payload_size, "payload size mismatch");
        let bucket = self.bucket_of(head, key);
        let previous = head.get(bucket);
        {
            let mut node = self.records.get_mut(body, link)?;
            let bytes = node.as_mut_slice();
            link::write_le(previous, self.link_width, &mut bytes[..self.link_width]);
            bytes[self.link_width..self.link_width + self.key_size].copy_from_slice(key);
            bytes[self.link_width + self.key_size..].copy_from_slice(payload);
        }
        body.flush()?;
        head.set(bucket, link);
        Ok(())
    }

    /// Read-only access to the payload of the node at `link`.
    pub fn payload(&self, body: &Body, link: LinkValue) -> Result<Accessor<'_>> {
        let record = self.records.get(body, link)?;
        // The caller only ever reads through `as_slice`, so returning
        // the whole-record accessor and letting callers index past
        // `link_width + key_size` is sufficient; narrower views aren't
        // needed since payload is always the record's tail.
        Ok(record)
    }

    /// Mutable access to the payload of the node at `link`, for
    /// in-place revocation (overwrite, never delete).
    pub fn payload_mut<'b>(&self, body: &'b Body, link: LinkValue) -> Result<MutAccessor<'b>> {
        self.records.get_mut(body, link)
    }

    /// Byte offset of the payload within one record, for slicing an
    /// accessor returned by [`Self::payload`].
    #[must_use]
    pub fn payload_offset(&self) -> usize {
        self.link_width + self.key_size
    }

    /// Size in bytes of one payload.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.payload_size
    }
}

/// Iterator over a hashmap chain's links, newest first.
pub struct ChainIter<'a> {
    map: &'a Hashmap,
    head: &'a Head,
    body: &'a Body,
    key: &'a [u8],
    next: LinkValue,
}

impl Iterator for ChainIter<'_> {
    type Item = Result<LinkValue>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if link::is_terminal(self.next, self.map.link_width) {
                return None;
            }
            let link = self.next;
            let node = match self.map.records.get(self.body, link) {
                Ok(node) => node,
                Err(error) => return Some(Err(error)),
            };
            let bytes = node.as_slice(self.map.records.record_size());
            self.next = link::read_le(bytes, self.map.link_width);
            let key = &bytes[self.map.link_width..self.map.link_width + self.map.key_size];
            if key == self.key {
                return Some(Ok(link));
            }
        }
    }
}

#[cfg(test)]
mod hashmap_tests {
    use super::*;
    use crate::settings::GrowthRate;

    fn new_map(dir: &std::path::Path, buckets: u32) -> (Head, Body, Hashmap) {
        let head = Head::create(dir.join("m.head"), buckets, 4).unwrap();
        let body = Body::create(dir.join("m.body"), 8, 50 as GrowthRate).unwrap();
        let map = Hashmap::new(4, 8, 4);
        (head, body, map)
    }

    #[test]
    fn insert_then_find_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let (mut head, body, map) = new_map(dir.path(), 16);
        let key = b"12345678";
        let link = map.allocate(&body).unwrap();
        map.commit(&mut head, &body, link, key, &[1, 2, 3, 4]).unwrap();
        assert!(map.exists(&head, &body, key).unwrap());
        let found = map.first(&head, &body, key).unwrap().unwrap();
        assert_eq!(found, link);
    }

    #[test]
    fn chain_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let (mut head, body, map) = new_map(dir.path(), 16);
        let key = b"aaaaaaaa";
        let first = map.allocate(&body).unwrap();
        map.commit(&mut head, &body, first, key, &[1, 0, 0, 0]).unwrap();
        let second = map.allocate(&body).unwrap();
        map.commit(&mut head, &body, second, key, &[2, 0, 0, 0]).unwrap();
        let links: Vec<_> = map
            .iter(&head, &body, key)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(links, vec![second, first]);
    }

    #[test]
    fn distinct_keys_do_not_collide_in_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let (mut head, body, map) = new_map(dir.path(), 4);
        let link_a = map.allocate(&body).unwrap();
        map.commit(&mut head, &body, link_a, b"keyaaaaa", &[0; 4]).unwrap();
        let link_b = map.allocate(&body).unwrap();
        map.commit(&mut head, &body, link_b, b"keybbbbb", &[0; 4]).unwrap();
        assert!(map.exists(&head, &body, b"keyaaaaa").unwrap());
        assert!(map.exists(&head, &body, b"keybbbbb").unwrap());
        assert!(!map.exists(&head, &body, b"keyccccc").unwrap());
    }
}
