//! Memory-mapped file storage primitives (spec §4.A-D).
//!
//! Layered bottom-up: [`file`] wraps one OS file plus its mapping,
//! [`body`] adds growth with a remap lock on top, [`head`] is the
//! non-growing counterpart used for bucket arrays, [`accessor`] is the
//! borrowed-view type handed out by `body`, and [`locks`] provides the
//! process-wide and flush-intent advisory locks used by the store
//! lifecycle.

pub mod accessor;
pub mod body;
pub mod file;
pub mod head;
pub mod locks;

pub use accessor::{Accessor, MutAccessor};
pub use body::Body;
pub use file::MappedFile;
pub use head::Head;
pub use locks::{FlushLock, ProcessLock};
