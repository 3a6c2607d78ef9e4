//! Embedded, append-only, memory-mapped blockchain storage engine.
//!
//! Stores block headers, transactions, inputs, outputs, and the
//! candidate/confirmed chains as fixed-width records and variable
//! slabs over memory-mapped files, addressed by a chained hashmap
//! (keyed archives/indexes) and a positional arraymap (dense chains
//! and caches). No consensus logic, no networking, no wallet: this
//! crate is the storage layer a chain validator builds on top of.
//!
//! ## Layout
//!
//! - [`storage`] — file and mmap primitives: [`storage::MappedFile`],
//!   growable [`storage::Body`], fixed-size [`storage::Head`], and the
//!   process/flush advisory locks.
//! - [`primitives`] — allocation and addressing built on `storage`:
//!   [`primitives::RecordManager`], [`primitives::SlabManager`],
//!   [`primitives::Hashmap`], [`primitives::Arraymap`].
//! - [`tables`] — the fixed catalog of 16 named tables
//!   ([`tables::Catalog`]).
//! - [`store`] — store lifecycle (create/open/snapshot/close/restore)
//!   and the scoped [`store::Transactor`] write lock.
//! - [`query`] — chain semantics over the catalog: strong/weak tx
//!   association, spentness, coinbase maturity, candidate/confirmed
//!   chain maintenance, navigation ([`query::Query`]).
//! - [`chain`] — minimal stand-ins for the Bitcoin consensus types
//!   this engine stores but does not interpret.
//! - [`link`] — fixed-width little-endian link addressing.
//! - [`settings`] — per-table tuning ([`settings::Settings`]).
//! - [`error`] — the flat error taxonomy ([`error::Error`]).

#![warn(missing_docs)]

pub mod chain;
pub mod error;
pub mod link;
pub mod primitives;
pub mod query;
pub mod settings;
pub mod storage;
pub mod store;
pub mod tables;

pub use chain::{Block, Context, Hash, Header, Input, Output, Point, Transaction};
pub use error::{Error, Result};
pub use link::LinkValue;
pub use query::Query;
pub use settings::Settings;
pub use store::Store;
pub use tables::Catalog;
