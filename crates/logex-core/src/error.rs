//! Error taxonomy for the storage engine.

use thiserror::Error;

/// Failures surfaced by [`Store`](crate::Store) operations.
///
/// Feed readers log these and keep going; consumer-facing callers get them
/// back as a failed result, never as a panic.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing database file could not be opened or created.
    #[error("storage unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    /// A statement failed to prepare, bind, or execute (includes constraint
    /// violations).
    #[error("statement failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No log entry exists with the requested id.
    #[error("no log entry with id {id}")]
    NotFound { id: i64 },

    /// The store was closed; the handle can no longer issue statements.
    #[error("store is closed")]
    Closed,
}
