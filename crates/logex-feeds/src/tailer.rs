//! File tail reader — ingests newly appended lines from plain-text log files
//! in one directory, resumable through persisted per-file byte offsets.
//!
//! Offsets are keyed by file basename, so a file that was truncated or
//! replaced by a shorter one is detected by size and re-read from the start.
//! Lines are read as raw bytes and converted lossily; binary content cannot
//! wedge a file's offset.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use logex_core::Store;

/// Subdirectory of the state directory holding one offset file per basename.
pub const OFFSETS_DIR: &str = "offsets";

// ---------------------------------------------------------------------------
// Offset persistence
// ---------------------------------------------------------------------------

fn offset_path(state_dir: &Path, basename: &str) -> PathBuf {
    state_dir.join(OFFSETS_DIR).join(format!("{basename}.offset"))
}

/// Read the stored offset for `basename`. Absent or unparseable means 0.
pub fn read_offset(state_dir: &Path, basename: &str) -> u64 {
    std::fs::read_to_string(offset_path(state_dir, basename))
        .ok()
        .and_then(|text| text.trim().parse().ok())
        .unwrap_or(0)
}

/// Persist the offset for `basename`. Write failures are non-fatal: the next
/// pass may re-ingest lines, which at-least-once ingestion admits.
pub fn write_offset(state_dir: &Path, basename: &str, offset: u64) {
    let path = offset_path(state_dir, basename);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(err) = std::fs::write(&path, format!("{offset}\n")) {
        tracing::warn!(error = %err, path = %path.display(), "could not persist file offset");
    }
}

// ---------------------------------------------------------------------------
// Tailing
// ---------------------------------------------------------------------------

/// Ingest everything appended to `path` since the last pass.
///
/// Seeks to the stored offset (clamped to 0 when the file shrank below it),
/// inserts one entry per line with `source` = full path and `unit` = file
/// basename, then persists the byte position reached — even when no lines
/// were read, so the offset converges on the current size. Any failure to
/// open or stat the file skips it without affecting other files.
pub fn tail_file(store: &Store, state_dir: &Path, path: &Path) {
    let Some(basename) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return;
    };
    let stored = read_offset(state_dir, &basename);

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            tracing::debug!(error = %err, path = %path.display(), "skipping unreadable file");
            return;
        }
    };
    let size = match file.metadata() {
        Ok(meta) => meta.len(),
        Err(err) => {
            tracing::debug!(error = %err, path = %path.display(), "skipping unstattable file");
            return;
        }
    };
    // Truncated or replaced by a shorter file: start over.
    let start = if stored <= size { stored } else { 0 };

    let mut reader = BufReader::new(file);
    if start > 0 {
        if let Err(err) = reader.seek(SeekFrom::Start(start)) {
            tracing::debug!(error = %err, path = %path.display(), "seek failed, skipping file");
            return;
        }
    }

    let source = path.to_string_lossy();
    let mut pos = start;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pos += n as u64;
                let line = String::from_utf8_lossy(&buf);
                let message = line.trim_end_matches(['\n', '\r']);
                if let Err(err) = store.insert(&source, &basename, message, "") {
                    tracing::warn!(error = %err, path = %path.display(), "failed to ingest line");
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, path = %path.display(), "read failed mid-file");
                break;
            }
        }
    }
    write_offset(state_dir, &basename, pos);
}

/// One pass over the watch directory: tail every regular, non-hidden file.
/// No recursion into subdirectories. One file's failure never aborts the
/// pass; the running flag is checked between files.
pub fn scan_directory(store: &Store, state_dir: &Path, watch_dir: &Path, running: &AtomicBool) {
    let entries = match std::fs::read_dir(watch_dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(error = %err, dir = %watch_dir.display(), "cannot read watch directory");
            return;
        }
    };
    for entry in entries.flatten() {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        tail_file(store, state_dir, &entry.path());
    }
}

/// Tailer loop: re-scan the watch directory until the running flag clears,
/// sleeping `poll_interval` between passes in small slices so shutdown is
/// observed promptly.
pub fn run(
    store: Arc<Store>,
    state_dir: PathBuf,
    watch_dir: PathBuf,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
) {
    tracing::info!(dir = %watch_dir.display(), "tailing log files");
    while running.load(Ordering::SeqCst) {
        scan_directory(&store, &state_dir, &watch_dir, &running);
        sleep_watching_flag(&running, poll_interval);
    }
}

fn sleep_watching_flag(running: &AtomicBool, total: Duration) {
    const SLICE: Duration = Duration::from_millis(50);
    let mut remaining = total;
    while !remaining.is_zero() {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        let nap = SLICE.min(remaining);
        std::thread::sleep(nap);
        remaining -= nap;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_offset(dir.path(), "syslog"), 0);
        write_offset(dir.path(), "syslog", 4096);
        assert_eq!(read_offset(dir.path(), "syslog"), 4096);
    }

    #[test]
    fn garbage_offset_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = offset_path(dir.path(), "syslog");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not a number\n").unwrap();
        assert_eq!(read_offset(dir.path(), "syslog"), 0);
    }
}
