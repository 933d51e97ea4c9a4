//! Journal feed reader — follows the live system journal via
//! `journalctl -o json -f`, resumable through a persisted cursor.
//!
//! The follower reads one JSON record per line from the child's stdout,
//! decodes the fields it cares about tolerantly (anything missing becomes an
//! empty value, never an error), inserts the record into the store, and then
//! persists the record's cursor token. A crash between insert and cursor
//! write duplicates at most one record on the next start; it never loses one.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use logex_core::Store;
use serde::Deserialize;

/// Source label recorded on every journal entry.
pub const JOURNAL_SOURCE: &str = "journal";

/// File name of the persisted cursor inside the state directory.
pub const CURSOR_FILE: &str = "journal.cursor";

// ---------------------------------------------------------------------------
// Record decoding
// ---------------------------------------------------------------------------

/// One record of the journal's line-oriented JSON stream.
///
/// All fields are optional; journald only emits the ones it has. Unknown
/// fields are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct JournalRecord {
    #[serde(rename = "MESSAGE")]
    message: Option<FieldValue>,
    #[serde(rename = "_SYSTEMD_UNIT")]
    unit: Option<FieldValue>,
    #[serde(rename = "__REALTIME_TIMESTAMP")]
    timestamp: Option<FieldValue>,
    #[serde(rename = "__CURSOR")]
    cursor: Option<FieldValue>,
}

/// A journal field value. journald emits UTF-8 data as a JSON string and
/// non-UTF-8 data as an array of bytes; timestamps show up as strings of
/// microseconds. Everything is normalized to text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Text(String),
    Bytes(Vec<u8>),
    Number(i64),
    Other(serde_json::Value),
}

impl FieldValue {
    fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Other(v) => v.to_string(),
        }
    }
}

impl JournalRecord {
    /// Decode one line of `journalctl -o json` output.
    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// The message text, or `None` when the record carries no message.
    /// Such records are dropped by the follower.
    pub fn message(&self) -> Option<String> {
        self.message.as_ref().map(FieldValue::as_text)
    }

    /// The systemd unit, empty when absent.
    pub fn unit(&self) -> String {
        self.unit.as_ref().map(FieldValue::as_text).unwrap_or_default()
    }

    /// The realtime timestamp as reported by the journal, empty when absent.
    pub fn timestamp(&self) -> String {
        self.timestamp
            .as_ref()
            .map(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// The opaque continuation token identifying this record.
    pub fn cursor(&self) -> Option<String> {
        self.cursor.as_ref().map(FieldValue::as_text)
    }
}

// ---------------------------------------------------------------------------
// Cursor checkpoint
// ---------------------------------------------------------------------------

/// Read the persisted cursor. A missing, unreadable, or empty file is the
/// valid "start fresh" state.
pub fn read_checkpoint(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let cursor = text.lines().next()?.trim();
    if cursor.is_empty() {
        None
    } else {
        Some(cursor.to_string())
    }
}

/// Persist the cursor. Write failures are non-fatal: the next start may
/// re-ingest already-seen records, which at-least-once ingestion admits.
pub fn write_checkpoint(path: &Path, cursor: &str) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(err) = std::fs::write(path, format!("{cursor}\n")) {
        tracing::warn!(error = %err, path = %path.display(), "could not persist journal cursor");
    }
}

// ---------------------------------------------------------------------------
// Stream handle
// ---------------------------------------------------------------------------

/// Shared handle to the follower's child process, used by the coordinator to
/// unblock the follower's blocking read on stop.
#[derive(Clone, Default)]
pub struct StreamHandle {
    child: Arc<Mutex<Option<Child>>>,
}

impl StreamHandle {
    pub fn new() -> Self {
        Self::default()
    }

    fn attach(&self, child: Child) {
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(child);
    }

    fn detach(&self) -> Option<Child> {
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        slot.take()
    }

    /// Kill the underlying stream so a blocked read returns promptly.
    pub fn interrupt(&self) {
        let mut slot = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(child) = slot.as_mut() {
            let _ = child.kill();
        }
    }
}

// ---------------------------------------------------------------------------
// Follower
// ---------------------------------------------------------------------------

/// Build the `journalctl` invocation, resuming after `cursor` when present.
pub fn journal_command(cursor: Option<&str>) -> Command {
    let mut cmd = Command::new("journalctl");
    cmd.args(["-o", "json", "-f"]);
    if let Some(cursor) = cursor {
        cmd.arg(format!("--after-cursor={cursor}"));
    }
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

/// Follow the live journal until the running flag clears or the stream ends.
///
/// Reads the last checkpoint, spawns `journalctl`, and consumes its stdout.
/// An unavailable `journalctl` is logged and swallowed; the rest of the
/// system keeps running without the journal feed.
pub fn run(store: Arc<Store>, cursor_path: &Path, running: Arc<AtomicBool>, handle: StreamHandle) {
    let cursor = read_checkpoint(cursor_path);
    let mut child = match journal_command(cursor.as_deref()).spawn() {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!(error = %err, "could not spawn journalctl, journal feed disabled");
            return;
        }
    };
    let Some(stdout) = child.stdout.take() else {
        tracing::warn!("journalctl spawned without stdout, journal feed disabled");
        let _ = child.kill();
        let _ = child.wait();
        return;
    };
    handle.attach(child);
    // Re-check after attach: a stop() issued before the child existed had
    // nothing to interrupt, and must not leave this thread blocked.
    if running.load(Ordering::SeqCst) {
        tracing::info!(resumed = cursor.is_some(), "following system journal");
        follow_stream(&store, cursor_path, &running, BufReader::new(stdout));
    }

    if let Some(mut child) = handle.detach() {
        let _ = child.kill();
        let _ = child.wait();
    }
}

/// Consume a line-oriented journal record stream until it ends or the
/// running flag clears. Factored over `BufRead` so tests can drive it
/// without a journald.
pub fn follow_stream(
    store: &Store,
    cursor_path: &Path,
    running: &AtomicBool,
    reader: impl BufRead,
) {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match line {
            Ok(line) => ingest_record(store, cursor_path, &line),
            // The stream was closed under us (normal on stop).
            Err(_) => break,
        }
    }
}

/// Ingest one raw record line. Undecodable or message-less records are
/// dropped; a failed insert is logged and the stream continues.
fn ingest_record(store: &Store, cursor_path: &Path, line: &str) {
    let record = match JournalRecord::decode(line) {
        Ok(record) => record,
        Err(err) => {
            tracing::debug!(error = %err, "dropping undecodable journal record");
            return;
        }
    };
    let Some(message) = record.message() else {
        return;
    };
    match store.insert(JOURNAL_SOURCE, &record.unit(), &message, &record.timestamp()) {
        Ok(_) => {
            if let Some(cursor) = record.cursor() {
                write_checkpoint(cursor_path, &cursor);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to ingest journal record");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
