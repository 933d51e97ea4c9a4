//! Store — SQLite-backed log store with an FTS5 full-text index and tags.
//!
//! The store is the single source of truth; feed readers write into it and
//! consumers read from it, never from the feeds directly. One instance is
//! shared across threads as `Arc<Store>`; a single mutex guards the
//! connection for the full duration of every statement. Search results are
//! materialized into a `Vec` while the guard is held (bounded by `limit`),
//! so no cursor ever escapes the lock.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;
use crate::types::LogEntry;

/// Idempotent schema: primary table, external-content FTS5 index kept in
/// lockstep by an AFTER INSERT trigger, and the tag tables.
const SCHEMA: &str = "
BEGIN;
CREATE TABLE IF NOT EXISTS logs(
    id      INTEGER PRIMARY KEY,
    source  TEXT NOT NULL,
    unit    TEXT NOT NULL,
    ts      TEXT NOT NULL,
    message TEXT NOT NULL
);
CREATE VIRTUAL TABLE IF NOT EXISTS logs_fts USING fts5(
    message,
    content='logs',
    content_rowid='id'
);
CREATE TRIGGER IF NOT EXISTS logs_ai AFTER INSERT ON logs BEGIN
    INSERT INTO logs_fts(rowid, message) VALUES (new.id, new.message);
END;
CREATE TABLE IF NOT EXISTS tags(
    id   INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS log_tags(
    log_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    UNIQUE(log_id, tag_id)
);
COMMIT;
";

/// Durable, thread-safe log store.
///
/// All operations serialize on the internal guard. After [`Store::close`]
/// every operation fails with [`StoreError::Closed`].
pub struct Store {
    conn: Mutex<Option<Connection>>,
}

impl Store {
    /// Open or create the store at `path`, creating the schema if absent.
    ///
    /// Fails with [`StoreError::Unavailable`] when the backing file cannot
    /// be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(StoreError::Unavailable)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Run `f` with the live connection under the guard, or fail if closed.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_mut() {
            Some(conn) => f(conn),
            None => Err(StoreError::Closed),
        }
    }

    /// Insert one log entry and its full-text index row atomically.
    ///
    /// The index row is created by the `logs_ai` trigger inside the same
    /// statement, so either both records exist afterwards or neither does.
    /// Returns the assigned id; ids are monotonic in the order inserts are
    /// serialized by the guard.
    pub fn insert(
        &self,
        source: &str,
        unit: &str,
        message: &str,
        timestamp: &str,
    ) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO logs(source, unit, ts, message) VALUES (?1, ?2, ?3, ?4)",
                params![source, unit, timestamp, message],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Search stored entries, newest-timestamp-first.
    ///
    /// An empty `query` is a plain recency scan; a non-empty query is matched
    /// against the FTS5 index (FTS5 query syntax, so a malformed query comes
    /// back as [`StoreError::Sqlite`]). `offset` beyond the result count
    /// yields an empty page, not an error.
    pub fn search(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<LogEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            if query.is_empty() {
                let mut stmt = conn.prepare(
                    "SELECT id, source, unit, ts, message FROM logs \
                     ORDER BY ts DESC, id DESC LIMIT ?1 OFFSET ?2",
                )?;
                let rows = stmt.query_map(params![limit, offset], row_to_entry)?;
                for row in rows {
                    out.push(row?);
                }
            } else {
                let mut stmt = conn.prepare(
                    "SELECT logs.id, logs.source, logs.unit, logs.ts, logs.message FROM logs \
                     JOIN logs_fts ON logs_fts.rowid = logs.id \
                     WHERE logs_fts MATCH ?1 \
                     ORDER BY logs.ts DESC, logs.id DESC LIMIT ?2 OFFSET ?3",
                )?;
                let rows = stmt.query_map(params![query, limit, offset], row_to_entry)?;
                for row in rows {
                    out.push(row?);
                }
            }
            Ok(out)
        })
    }

    /// Fetch the complete, untruncated message text for one entry.
    pub fn message(&self, id: i64) -> Result<String, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT message FROM logs WHERE id = ?1", [id], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or(StoreError::NotFound { id })
        })
    }

    /// Attach a tag to an entry, creating the tag on first use.
    ///
    /// Idempotent: adding the same tag twice has no additional effect.
    pub fn add_tag(&self, id: i64, name: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("INSERT OR IGNORE INTO tags(name) VALUES (?1)", [name])?;
            let tag_id: i64 =
                tx.query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| {
                    row.get(0)
                })?;
            tx.execute(
                "INSERT OR IGNORE INTO log_tags(log_id, tag_id) VALUES (?1, ?2)",
                params![id, tag_id],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Detach a tag from an entry. A tag or link that does not exist is a
    /// no-op, not an error.
    pub fn remove_tag(&self, id: i64, name: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tag_id: Option<i64> = conn
                .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| {
                    row.get(0)
                })
                .optional()?;
            if let Some(tag_id) = tag_id {
                conn.execute(
                    "DELETE FROM log_tags WHERE log_id = ?1 AND tag_id = ?2",
                    params![id, tag_id],
                )?;
            }
            Ok(())
        })
    }

    /// List the tag names attached to one entry, sorted for determinism.
    pub fn list_tags(&self, id: i64) -> Result<Vec<String>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT tags.name FROM tags \
                 JOIN log_tags ON tags.id = log_tags.tag_id \
                 WHERE log_tags.log_id = ?1 ORDER BY tags.name",
            )?;
            let rows = stmt.query_map([id], |row| row.get(0))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    /// Release the connection. Safe to call more than once; all subsequent
    /// operations fail with [`StoreError::Closed`].
    pub fn close(&self) {
        let mut guard = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = guard.take() {
            if let Err((_conn, err)) = conn.close() {
                tracing::warn!(error = %err, "error while closing store");
            }
        }
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LogEntry> {
    Ok(LogEntry {
        id: row.get(0)?,
        source: row.get(1)?,
        unit: row.get(2)?,
        timestamp: row.get(3)?,
        message: row.get(4)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
