//! Core types for logex-core.

/// A persisted log entry as returned by [`Store::search`](crate::Store::search).
///
/// Entries are created only by [`Store::insert`](crate::Store::insert) and are
/// never mutated or deleted afterwards. The `timestamp` is whatever string the
/// origin supplied; it is stored verbatim and never parsed or validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Assigned id, monotonically increasing and unique across the store.
    pub id: i64,
    /// Origin label: `"journal"` for the system journal, a file path for
    /// tailed files.
    pub source: String,
    /// Subsystem or service name. Empty when the origin did not report one.
    pub unit: String,
    /// Origin-supplied timestamp string, stored verbatim.
    pub timestamp: String,
    /// Raw message text, unbounded length.
    pub message: String,
}
