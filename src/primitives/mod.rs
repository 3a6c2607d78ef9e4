//! Allocation and addressing primitives built on top of [`crate::storage`]
//! (spec §4.E-G): fixed-width records, variable-width slabs, a chained
//! hashmap, and a positional arraymap.

pub mod arraymap;
pub mod hashmap;
pub mod record_manager;
pub mod slab_manager;

pub use arraymap::{ArrayReader, Arraymap};
pub use hashmap::Hashmap;
pub use record_manager::RecordManager;
pub use slab_manager::SlabManager;
