//! Test builders — scratch stores and corpora with predictable timestamps.
//!
//! These helpers panic on invalid input rather than returning `Result`;
//! readability in assertions beats error plumbing here.

use std::sync::Arc;

use logex::Store;
use tempfile::TempDir;

/// Open a store backed by a fresh temp directory. Keep the `TempDir` alive
/// for as long as the store is in use.
pub fn temp_store() -> (Arc<Store>, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = Store::open(dir.path().join("log.db")).expect("open temp store");
    (Arc::new(store), dir)
}

/// Deterministic, strictly increasing timestamp for index `i` (supports up
/// to one hour of one-second steps).
pub fn ts(i: usize) -> String {
    format!("2024-01-15T10:{:02}:{:02}Z", i / 60, i % 60)
}

/// Insert `n` entries with messages `"log line 0"..` and increasing
/// timestamps. Returns the assigned ids in insertion order.
pub fn insert_numbered(store: &Store, n: usize) -> Vec<i64> {
    (0..n)
        .map(|i| {
            store
                .insert("test", "test.service", &format!("log line {i}"), &ts(i))
                .expect("insert")
        })
        .collect()
}
