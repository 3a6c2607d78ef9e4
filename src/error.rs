//! Error taxonomy for the storage engine.
//!
//! One flat enum, one variant per failure the store can report to a
//! caller. Composite lifecycle operations (`Store::create`,
//! `Store::close`) capture the first non-success they observe but
//! still run every remaining release step, then return the captured
//! error — see [`Error`] usage in `store.rs`.

use thiserror::Error;

/// Errors surfaced by the storage engine.
#[derive(Error, Debug)]
pub enum Error {
    /// Could not acquire the catalog transactor mutex.
    #[error("transactor lock failed")]
    TransactorLock,

    /// Could not acquire the process-wide advisory lock.
    #[error("process lock failed")]
    ProcessLock,

    /// Could not acquire the flush-intent advisory lock.
    #[error("flush lock failed")]
    FlushLock,

    /// Could not release the process-wide advisory lock.
    #[error("process unlock failed")]
    ProcessUnlock,

    /// Could not release the flush-intent advisory lock.
    #[error("flush unlock failed")]
    FlushUnlock,

    /// Could not clear a directory during create/rollback.
    #[error("clear directory failed")]
    ClearDirectory,

    /// Could not remove a directory.
    #[error("remove directory failed")]
    RemoveDirectory,

    /// Could not rename a directory (head snapshot rotation).
    #[error("rename directory failed")]
    RenameDirectory,

    /// Could not create a directory.
    #[error("create directory failed")]
    CreateDirectory,

    /// Could not create a head or body file.
    #[error("create file failed")]
    CreateFile,

    /// Could not write a file's contents out (backup).
    #[error("dump file failed")]
    DumpFile,

    /// Operation attempted against a table that has not been loaded.
    #[error("file not loaded")]
    UnloadedFile,

    /// A table's `create` step failed.
    #[error("create table failed")]
    CreateTable,

    /// A table's `verify` step failed (size/shape mismatch on open).
    #[error("verify table failed")]
    VerifyTable,

    /// A table's `close` step failed.
    #[error("close table failed")]
    CloseTable,

    /// A table's `backup` step failed.
    #[error("backup table failed")]
    BackupTable,

    /// A table's `restore` step failed.
    #[error("restore table failed")]
    RestoreTable,

    /// `restore` found neither `/primary` nor `/secondary`.
    #[error("missing backup")]
    MissingBackup,

    /// A link allocation would overflow the configured link width.
    #[error("allocation would overflow link width")]
    Eof,

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, Error>;
