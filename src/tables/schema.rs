//! Per-table descriptors for the fixed catalog (spec §4.H, Design Note
//! "Template specialization over many tables").
//!
//! The original source specializes record width, key width and link
//! width at compile time per table. Without const-generic ergonomics
//! for that here, every table instead carries its widths as plain
//! runtime fields on a [`Descriptor`], paid once per element access
//! alongside the mapped-pointer computation that access already does.

/// Link width, in bytes, used by a hashmap table's bucket slots and
/// chain `next` fields.
pub const ARCHIVE_LINK_WIDTH: usize = 5;

/// Link width used by the smaller index tables.
pub const INDEX_LINK_WIDTH: usize = 4;

/// Static shape of one table: how many buckets its head has (hashmap
/// tables only), the key width, the payload width, the link width used
/// to address its own elements, and the growth headroom rate for its
/// body.
#[derive(Debug, Clone, Copy)]
pub struct Descriptor {
    /// Human-readable table name, used only for logging/backup paths.
    pub name: &'static str,
    /// Bucket count (hashmap tables) or 0 (arraymap tables).
    pub buckets: u32,
    /// Key width in bytes (hashmap tables) or 0 (arraymap tables).
    pub key_size: usize,
    /// Payload width in bytes.
    pub payload_size: usize,
    /// Link width in bytes used to address this table's own elements.
    pub link_width: usize,
    /// Growth headroom percentage applied by `Body::reserve`.
    pub rate: u16,
}
