//! The fixed catalog of 16 tables (spec §3, §4.H, Design Note "Catalog
//! of tables as a field-per-table record").
//!
//! Every table owns exactly one (head, body) file pair and is backed
//! by either a [`Hashmap`] (keyed archives/indexes) or an [`Arraymap`]
//! (positional archives/indexes/caches). [`Catalog`] holds one named
//! field per table, in the fixed dependency order the store creates
//! and opens them in, deliberately rather than as a generic registry.

pub mod schema;

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::link::LinkValue;
use crate::primitives::{ArrayReader, Arraymap, Hashmap};
use crate::settings::Settings;
use crate::storage::{Accessor, Body, Head, MutAccessor};
use schema::Descriptor;

const INITIAL_BODY_SIZE: u64 = 64;

fn head_path(root: &Path, name: &str) -> PathBuf {
    root.join("heads").join(name)
}

fn body_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.body"))
}

/// A hashmap-backed table: its own (head, body) pair plus the chained
/// hashmap addressing scheme over them.
pub struct HashmapTable {
    descriptor: Descriptor,
    head: Head,
    body: Body,
    map: Hashmap,
}

impl HashmapTable {
    fn create(root: &Path, descriptor: Descriptor) -> Result<Self> {
        let head = Head::create(head_path(root, descriptor.name), descriptor.buckets, descriptor.link_width)
            .map_err(|_| Error::CreateTable)?;
        let body = Body::create(body_path(root, descriptor.name), INITIAL_BODY_SIZE, descriptor.rate)
            .map_err(|_| Error::CreateTable)?;
        let map = Hashmap::new(descriptor.link_width, descriptor.key_size, descriptor.payload_size);
        Ok(Self { descriptor, head, body, map })
    }

    fn open(root: &Path, descriptor: Descriptor) -> Result<Self> {
        let head = Head::open(head_path(root, descriptor.name), descriptor.buckets, descriptor.link_width)
            .map_err(|_| Error::VerifyTable)?;
        let logical = u64::from(head.logical_size());
        let body = Body::open(body_path(root, descriptor.name), logical, descriptor.rate)
            .map_err(|_| Error::VerifyTable)?;
        if (body.capacity() as u64) < logical {
            return Err(Error::VerifyTable);
        }
        let map = Hashmap::new(descriptor.link_width, descriptor.key_size, descriptor.payload_size);
        Ok(Self { descriptor, head, body, map })
    }

    /// Table name, as used for its on-disk file names.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// True if any element keyed by `key` exists.
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.map.exists(&self.head, &self.body, key)
    }

    /// Link of the newest element keyed by `key`, if any.
    pub fn first(&self, key: &[u8]) -> Result<Option<LinkValue>> {
        self.map.first(&self.head, &self.body, key)
    }

    /// Every element's link keyed by `key`, newest first.
    pub fn iter<'a>(&'a self, key: &'a [u8]) -> crate::primitives::hashmap::ChainIter<'a> {
        self.map.iter(&self.head, &self.body, key)
    }

    /// Allocates, writes and publishes one new element in a single call.
    pub fn put(&mut self, key: &[u8], payload: &[u8]) -> Result<LinkValue> {
        let link = self.map.allocate(&self.body)?;
        self.map.commit(&mut self.head, &self.body, link, key, payload)?;
        Ok(link)
    }

    /// Reserves a new element without publishing it. Used when a
    /// record must reference its own not-yet-known link (e.g. a `tx`
    /// record embedding its own link into sibling `input` records
    /// before the `tx` record itself is committed).
    pub fn allocate(&self) -> Result<LinkValue> {
        self.map.allocate(&self.body)
    }

    /// Publishes a previously `allocate`d element.
    pub fn commit(&mut self, link: LinkValue, key: &[u8], payload: &[u8]) -> Result<()> {
        self.map.commit(&mut self.head, &self.body, link, key, payload)
    }

    /// Read-only access to the record at `link`; payload starts at
    /// `payload_offset()` within the returned bytes.
    pub fn record(&self, link: LinkValue) -> Result<Accessor<'_>> {
        self.map.payload(&self.body, link)
    }

    /// Mutable access to the record at `link`, for `strong_tx`-style
    /// revocation by overwrite.
    pub fn record_mut(&self, link: LinkValue) -> Result<MutAccessor<'_>> {
        self.map.payload_mut(&self.body, link)
    }

    /// Copies out just the payload bytes of the record at `link`.
    pub fn payload(&self, link: LinkValue) -> Result<Vec<u8>> {
        let offset = self.payload_offset();
        let size = self.payload_size();
        let record = self.record(link)?;
        Ok(record.as_slice(offset + size)[offset..].to_vec())
    }

    /// Copies out just the key bytes of the record at `link`, i.e. the
    /// key this element was originally inserted under. Used by reverse
    /// navigation (e.g. recovering an input's referenced outpoint from
    /// its own link).
    pub fn key(&self, link: LinkValue) -> Result<Vec<u8>> {
        let offset = self.descriptor.link_width;
        let size = self.descriptor.key_size;
        let record = self.record(link)?;
        Ok(record.as_slice(offset + size)[offset..].to_vec())
    }

    /// Overwrites just the payload bytes of the record at `link`.
    pub fn set_payload(&self, link: LinkValue, payload: &[u8]) -> Result<()> {
        let offset = self.payload_offset();
        assert_eq!(payload.len(), self.payload_size(), "payload size mismatch");
        let mut record = self.record_mut(link)?;
        record.as_mut_slice()[offset..offset + payload.len()].copy_from_slice(payload);
        Ok(())
    }

    /// Byte offset of the payload within one record.
    #[must_use]
    pub fn payload_offset(&self) -> usize {
        self.map.payload_offset()
    }

    /// Size in bytes of one payload.
    #[must_use]
    pub fn payload_size(&self) -> usize {
        self.map.payload_size()
    }

    /// The underlying body file, for an auxiliary slab manager that
    /// stores this table's variable-length payloads (scripts,
    /// witnesses, tx-link vectors) alongside its chain nodes.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    fn snap(&mut self) {
        self.head.set_logical_size(self.body.logical() as u32);
    }

    fn flush(&self) -> Result<()> {
        self.body.flush()?;
        self.head.flush()
    }

    fn close(&mut self) {
        self.body.unload();
        self.head.unload();
    }

    fn restore(&mut self) -> Result<()> {
        let logical = u64::from(self.head.logical_size());
        self.body.reset_logical(logical);
        self.body.truncate_to_logical().map_err(|_| Error::RestoreTable)
    }
}

/// An arraymap-backed table: its own (head, body) pair plus the
/// positional addressing scheme over them.
pub struct ArraymapTable {
    descriptor: Descriptor,
    head: Head,
    body: Body,
    map: Arraymap,
}

impl ArraymapTable {
    fn create(root: &Path, descriptor: Descriptor) -> Result<Self> {
        let head = Head::create(head_path(root, descriptor.name), 0, descriptor.link_width)
            .map_err(|_| Error::CreateTable)?;
        let body = Body::create(body_path(root, descriptor.name), INITIAL_BODY_SIZE, descriptor.rate)
            .map_err(|_| Error::CreateTable)?;
        let map = Arraymap::new(descriptor.payload_size, descriptor.link_width);
        Ok(Self { descriptor, head, body, map })
    }

    fn open(root: &Path, descriptor: Descriptor) -> Result<Self> {
        let head = Head::open(head_path(root, descriptor.name), 0, descriptor.link_width)
            .map_err(|_| Error::VerifyTable)?;
        let logical = u64::from(head.logical_size());
        let body = Body::open(body_path(root, descriptor.name), logical, descriptor.rate)
            .map_err(|_| Error::VerifyTable)?;
        if (body.capacity() as u64) < logical {
            return Err(Error::VerifyTable);
        }
        let map = Arraymap::new(descriptor.payload_size, descriptor.link_width);
        Ok(Self { descriptor, head, body, map })
    }

    /// Table name, as used for its on-disk file names.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Number of populated positions.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.map.count(&self.body)
    }

    /// Appends one record at the next position.
    pub fn push(&self, record: &[u8]) -> Result<LinkValue> {
        self.map.push(&self.body, record)
    }

    /// Writes `record` at `position`, padding with zero-valued records
    /// if needed. Used by foreign-keyed caches addressed by another
    /// table's link rather than by insertion order.
    pub fn set_at(&self, position: LinkValue, record: &[u8]) -> Result<()> {
        self.map.set(&self.body, position, record)
    }

    /// Removes the last populated position.
    pub fn pop(&self) {
        self.map.pop(&self.body);
    }

    /// Reads the record at `position`; exhausted (zeroed) past the end.
    pub fn get(&self, position: LinkValue) -> Result<ArrayReader> {
        self.map.get(&self.body, position)
    }

    /// The underlying body file, for an auxiliary slab manager storing
    /// this table's variable-length payloads (filter bytes, buffered
    /// serialized transactions).
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    fn snap(&mut self) {
        self.head.set_logical_size(self.body.logical() as u32);
    }

    fn flush(&self) -> Result<()> {
        self.body.flush()?;
        self.head.flush()
    }

    fn close(&mut self) {
        self.body.unload();
        self.head.unload();
    }

    fn restore(&mut self) -> Result<()> {
        let logical = u64::from(self.head.logical_size());
        self.body.reset_logical(logical);
        self.body.truncate_to_logical().map_err(|_| Error::RestoreTable)
    }
}

/// The fixed catalog: one field per table, fixed dependency order.
pub struct Catalog {
    // -- Archives -------------------------------------------------------
    /// Block headers, keyed by header hash.
    pub header: HashmapTable,
    /// Previously-referenced outpoint hashes, keyed by tx hash.
    pub point: HashmapTable,
    /// Transaction inputs, keyed by composite `(point_fk, point_index)`.
    pub input: HashmapTable,
    /// Transaction outputs, positional by global output link.
    pub output: ArraymapTable,
    /// Per-tx input/output link groupings, positional by tx link.
    pub puts: ArraymapTable,
    /// Transactions, keyed by tx hash.
    pub tx: HashmapTable,
    /// Per-header tx-link vectors, keyed by header link.
    pub txs: HashmapTable,

    // -- Indexes ----------------------------------------------------------
    /// Output script key to output link.
    pub address: HashmapTable,
    /// Candidate chain, positional by height.
    pub candidate: ArraymapTable,
    /// Confirmed chain, positional by height.
    pub confirmed: ArraymapTable,
    /// Tx link to header link association (strong/weak).
    pub strong_tx: HashmapTable,

    // -- Caches -----------------------------------------------------------
    /// Checkpoint bootstrap data, positional.
    pub bootstrap: ArraymapTable,
    /// Opaque neutrino/compact-filter header buffer, positional.
    pub buffer: ArraymapTable,
    /// Neutrino filter bodies, positional.
    pub neutrino: ArraymapTable,
    /// Cached block validation state, keyed by header link.
    pub validated_bk: HashmapTable,
    /// Cached tx validation state, keyed by tx link.
    pub validated_tx: HashmapTable,
}

impl Catalog {
    fn descriptors(settings: &Settings) -> CatalogDescriptors {
        use schema::{ARCHIVE_LINK_WIDTH as AW, INDEX_LINK_WIDTH as IW};
        CatalogDescriptors {
            header: Descriptor { name: "archive.header", buckets: settings.header_buckets, key_size: 32, payload_size: 88, link_width: AW, rate: settings.header_rate },
            point: Descriptor { name: "archive.point", buckets: settings.point_buckets, key_size: 32, payload_size: 1, link_width: AW, rate: settings.point_rate },
            input: Descriptor { name: "archive.input", buckets: settings.input_buckets, key_size: AW + 4, payload_size: AW + 4 + AW + 4 + AW + 4, link_width: AW, rate: settings.input_rate },
            output: Descriptor { name: "archive.output", buckets: 0, key_size: 0, payload_size: 8 + AW + 4 + AW, link_width: AW, rate: settings.output_rate },
            puts: Descriptor { name: "archive.puts", buckets: 0, key_size: 0, payload_size: AW + 4 + AW + 4, link_width: AW, rate: settings.puts_rate },
            tx: Descriptor { name: "archive.tx", buckets: settings.tx_buckets, key_size: 32, payload_size: 4 + 4 + 4 + 4 + AW, link_width: AW, rate: settings.tx_rate },
            txs: Descriptor { name: "archive.txs", buckets: settings.txs_buckets, key_size: AW, payload_size: AW + 4, link_width: AW, rate: settings.txs_rate },
            address: Descriptor { name: "index.address", buckets: settings.address_buckets, key_size: 32, payload_size: AW, link_width: IW, rate: settings.address_rate },
            candidate: Descriptor { name: "index.candidate", buckets: 0, key_size: 0, payload_size: AW, link_width: IW, rate: settings.candidate_rate },
            confirmed: Descriptor { name: "index.confirmed", buckets: 0, key_size: 0, payload_size: AW, link_width: IW, rate: settings.confirmed_rate },
            strong_tx: Descriptor { name: "index.strong_tx", buckets: settings.strong_tx_buckets, key_size: AW, payload_size: AW, link_width: IW, rate: settings.strong_tx_rate },
            bootstrap: Descriptor { name: "cache.bootstrap", buckets: 0, key_size: 0, payload_size: 32, link_width: IW, rate: 50 },
            buffer: Descriptor { name: "cache.buffer", buckets: 0, key_size: 0, payload_size: IW + 4, link_width: IW, rate: 50 },
            neutrino: Descriptor { name: "cache.neutrino", buckets: 0, key_size: 0, payload_size: 32 + IW + 4, link_width: IW, rate: 50 },
            validated_bk: Descriptor { name: "cache.validated_bk", buckets: 50_000, key_size: AW, payload_size: 4, link_width: IW, rate: 50 },
            validated_tx: Descriptor { name: "cache.validated_tx", buckets: 50_000, key_size: AW, payload_size: 4, link_width: IW, rate: 50 },
        }
    }

    /// Creates every table fresh under `root`.
    pub fn create(root: &Path, settings: &Settings) -> Result<Self> {
        let d = Self::descriptors(settings);
        Ok(Self {
            header: HashmapTable::create(root, d.header)?,
            point: HashmapTable::create(root, d.point)?,
            input: HashmapTable::create(root, d.input)?,
            output: ArraymapTable::create(root, d.output)?,
            puts: ArraymapTable::create(root, d.puts)?,
            tx: HashmapTable::create(root, d.tx)?,
            txs: HashmapTable::create(root, d.txs)?,
            address: HashmapTable::create(root, d.address)?,
            candidate: ArraymapTable::create(root, d.candidate)?,
            confirmed: ArraymapTable::create(root, d.confirmed)?,
            strong_tx: HashmapTable::create(root, d.strong_tx)?,
            bootstrap: ArraymapTable::create(root, d.bootstrap)?,
            buffer: ArraymapTable::create(root, d.buffer)?,
            neutrino: ArraymapTable::create(root, d.neutrino)?,
            validated_bk: HashmapTable::create(root, d.validated_bk)?,
            validated_tx: HashmapTable::create(root, d.validated_tx)?,
        })
    }

    /// Opens every table from `root`, verifying each as it loads.
    pub fn open(root: &Path, settings: &Settings) -> Result<Self> {
        let d = Self::descriptors(settings);
        Ok(Self {
            header: HashmapTable::open(root, d.header)?,
            point: HashmapTable::open(root, d.point)?,
            input: HashmapTable::open(root, d.input)?,
            output: ArraymapTable::open(root, d.output)?,
            puts: ArraymapTable::open(root, d.puts)?,
            tx: HashmapTable::open(root, d.tx)?,
            txs: HashmapTable::open(root, d.txs)?,
            address: HashmapTable::open(root, d.address)?,
            candidate: ArraymapTable::open(root, d.candidate)?,
            confirmed: ArraymapTable::open(root, d.confirmed)?,
            strong_tx: HashmapTable::open(root, d.strong_tx)?,
            bootstrap: ArraymapTable::open(root, d.bootstrap)?,
            buffer: ArraymapTable::open(root, d.buffer)?,
            neutrino: ArraymapTable::open(root, d.neutrino)?,
            validated_bk: HashmapTable::open(root, d.validated_bk)?,
            validated_tx: HashmapTable::open(root, d.validated_tx)?,
        })
    }

    /// Writes every table's current logical body size into its head.
    pub fn snap(&mut self) {
        self.header.snap();
        self.point.snap();
        self.input.snap();
        self.output.snap();
        self.puts.snap();
        self.tx.snap();
        self.txs.snap();
        self.address.snap();
        self.candidate.snap();
        self.confirmed.snap();
        self.strong_tx.snap();
        self.bootstrap.snap();
        self.buffer.snap();
        self.neutrino.snap();
        self.validated_bk.snap();
        self.validated_tx.snap();
    }

    /// Flushes every table's body and head to disk. Captures and
    /// returns the first failure but still flushes every remaining
    /// table.
    pub fn flush(&self) -> Result<()> {
        let mut first: Result<()> = Ok(());
        macro_rules! step {
            ($t:expr) => {
                if let Err(error) = $t.flush() {
                    if first.is_ok() {
                        first = Err(error);
                    }
                }
            };
        }
        step!(self.header);
        step!(self.point);
        step!(self.input);
        step!(self.output);
        step!(self.puts);
        step!(self.tx);
        step!(self.txs);
        step!(self.address);
        step!(self.candidate);
        step!(self.confirmed);
        step!(self.strong_tx);
        step!(self.bootstrap);
        step!(self.buffer);
        step!(self.neutrino);
        step!(self.validated_bk);
        step!(self.validated_tx);
        first
    }

    /// Closes every table's mappings unconditionally.
    pub fn close(&mut self) {
        self.header.close();
        self.point.close();
        self.input.close();
        self.output.close();
        self.puts.close();
        self.tx.close();
        self.txs.close();
        self.address.close();
        self.candidate.close();
        self.confirmed.close();
        self.strong_tx.close();
        self.bootstrap.close();
        self.buffer.close();
        self.neutrino.close();
        self.validated_bk.close();
        self.validated_tx.close();
    }

    /// Rewinds every table's body logical size to the value last
    /// recorded in its (now restored) head, truncating physical
    /// headroom accumulated since.
    pub fn restore(&mut self) -> Result<()> {
        let mut first: Result<()> = Ok(());
        macro_rules! step {
            ($t:expr) => {
                if let Err(error) = $t.restore() {
                    if first.is_ok() {
                        first = Err(error);
                    }
                }
            };
        }
        step!(self.header);
        step!(self.point);
        step!(self.input);
        step!(self.output);
        step!(self.puts);
        step!(self.tx);
        step!(self.txs);
        step!(self.address);
        step!(self.candidate);
        step!(self.confirmed);
        step!(self.strong_tx);
        step!(self.bootstrap);
        step!(self.buffer);
        step!(self.neutrino);
        step!(self.validated_bk);
        step!(self.validated_tx);
        first
    }
}

struct CatalogDescriptors {
    header: Descriptor,
    point: Descriptor,
    input: Descriptor,
    output: Descriptor,
    puts: Descriptor,
    tx: Descriptor,
    txs: Descriptor,
    address: Descriptor,
    candidate: Descriptor,
    confirmed: Descriptor,
    strong_tx: Descriptor,
    bootstrap: Descriptor,
    buffer: Descriptor,
    neutrino: Descriptor,
    validated_bk: Descriptor,
    validated_tx: Descriptor,
}

#[cfg(test)]
mod catalog_tests {
    use super::*;

    #[test]
    fn create_then_open_round_trips_every_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("heads")).unwrap();
        let settings = Settings {
            dir: dir.path().to_path_buf(),
            ..Settings::default()
        };
        {
            let mut catalog = Catalog::create(dir.path(), &settings).unwrap();
            let link = catalog.header.put(&[7u8; 32], &[0u8; 88]).unwrap();
            assert_eq!(link, 0);
            catalog.snap();
            catalog.flush().unwrap();
            catalog.close();
        }
        let catalog = Catalog::open(dir.path(), &settings).unwrap();
        assert!(catalog.header.exists(&[7u8; 32]).unwrap());
    }
}
