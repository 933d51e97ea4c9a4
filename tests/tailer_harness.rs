#![allow(unused)]
//! File tail reader integration harness.
//!
//! # What this covers
//!
//! - **Initial pass**: every line of a watched file is ingested with
//!   source = path, unit = basename, and the offset lands on the file size.
//! - **Resume**: a later pass ingests only bytes appended since the stored
//!   offset — no re-ingestion of the head of the file.
//! - **Truncation**: a file that shrank below its stored offset is re-read
//!   from the start.
//! - **Convergence**: a pass over an unchanged (or empty) file still writes
//!   the offset.
//! - **Robustness**: unreadable files, dot-files, and subdirectories are
//!   skipped; non-UTF-8 bytes are lossy-converted rather than wedging the
//!   file.
//!
//! # Running
//!
//! ```sh
//! cargo test --test tailer_harness
//! ```

mod common;
use common::*;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use logex::tailer;
use pretty_assertions::assert_eq;

/// Set up a watch dir and a state dir inside one temp dir.
fn dirs(dir: &tempfile::TempDir) -> (PathBuf, PathBuf) {
    let watch = dir.path().join("watch");
    let state = dir.path().join("state");
    std::fs::create_dir_all(&watch).unwrap();
    std::fs::create_dir_all(&state).unwrap();
    (watch, state)
}

fn write_lines(path: &Path, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    std::fs::write(path, body).unwrap();
}

// ---------------------------------------------------------------------------
// Initial pass
// ---------------------------------------------------------------------------

/// All lines land with source = full path and unit = basename, and the
/// persisted offset equals the file size.
#[test]
fn first_pass_ingests_whole_file() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("app.log");
    write_lines(&file, CORPUS_PLAIN);

    tailer::tail_file(&store, &state, &file);

    let entries = store.search("", 10, 0).unwrap();
    assert_eq!(entries.len(), CORPUS_PLAIN.len());
    assert!(entries.iter().all(|e| e.source == file.to_string_lossy()));
    assert!(entries.iter().all(|e| e.unit == "app.log"));
    assert!(entries.iter().all(|e| e.timestamp.is_empty()));

    let size = std::fs::metadata(&file).unwrap().len();
    assert_eq!(tailer::read_offset(&state, "app.log"), size);
}

/// Messages are stored without their trailing newline.
#[test]
fn lines_are_stored_without_newline() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("app.log");
    write_lines(&file, &["alpha", "bravo"]);

    tailer::tail_file(&store, &state, &file);

    let entries = store.search("", 10, 0).unwrap();
    assert!(entries.iter().any(|e| e.message == "alpha"));
    assert!(entries.iter().any(|e| e.message == "bravo"));
}

/// A trailing line with no final newline is still ingested and counted into
/// the offset.
#[test]
fn partial_last_line_is_ingested() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("app.log");
    std::fs::write(&file, "complete line\nno newline yet").unwrap();

    tailer::tail_file(&store, &state, &file);

    assert_eq!(store.search("", 10, 0).unwrap().len(), 2);
    let size = std::fs::metadata(&file).unwrap().len();
    assert_eq!(tailer::read_offset(&state, "app.log"), size);
}

// ---------------------------------------------------------------------------
// Resume and truncation
// ---------------------------------------------------------------------------

/// A second pass after an append ingests only the appended lines.
#[test]
fn resume_ingests_only_appended_bytes() {
    use std::io::Write;

    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("app.log");
    write_lines(&file, &["before restart"]);

    tailer::tail_file(&store, &state, &file);

    let mut f = std::fs::OpenOptions::new().append(true).open(&file).unwrap();
    writeln!(f, "after restart").unwrap();
    drop(f);

    tailer::tail_file(&store, &state, &file);

    assert_eq!(store.search("", 10, 0).unwrap().len(), 2);
    // The head of the file was not re-ingested.
    assert_eq!(store.search("before", 10, 0).unwrap().len(), 1);
}

/// A file recreated shorter than its stored offset is re-read from zero.
#[test]
fn shrunk_file_restarts_from_zero() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("rotating.log");
    write_lines(&file, &["old line one", "old line two", "old line three"]);

    tailer::tail_file(&store, &state, &file);
    assert_eq!(store.search("", 10, 0).unwrap().len(), 3);

    // Rotation: same name, shorter content.
    write_lines(&file, &["fresh line"]);
    tailer::tail_file(&store, &state, &file);

    assert_eq!(store.search("fresh", 10, 0).unwrap().len(), 1);
    let size = std::fs::metadata(&file).unwrap().len();
    assert_eq!(tailer::read_offset(&state, "rotating.log"), size);
}

/// Passing over an unchanged file ingests nothing and leaves the offset on
/// the file size; an empty file converges on offset 0.
#[test]
fn unchanged_and_empty_files_converge() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("quiet.log");
    std::fs::write(&file, "").unwrap();

    tailer::tail_file(&store, &state, &file);
    tailer::tail_file(&store, &state, &file);

    assert_eq!(store.search("", 10, 0).unwrap().len(), 0);
    assert_eq!(tailer::read_offset(&state, "quiet.log"), 0);
}

// ---------------------------------------------------------------------------
// Robustness
// ---------------------------------------------------------------------------

/// Non-UTF-8 bytes are lossy-converted; the pass completes and the offset
/// covers the whole file.
#[test]
fn non_utf8_lines_are_lossy_ingested() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let file = watch.join("binary.log");
    std::fs::write(&file, b"caf\xe9 latte\nplain line\n").unwrap();

    tailer::tail_file(&store, &state, &file);

    let entries = store.search("", 10, 0).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().any(|e| e.message == "caf\u{fffd} latte"));
    let size = std::fs::metadata(&file).unwrap().len();
    assert_eq!(tailer::read_offset(&state, "binary.log"), size);
}

/// A missing file is skipped without error and without touching state.
#[test]
fn missing_file_is_skipped() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);

    tailer::tail_file(&store, &state, &watch.join("nonexistent.log"));

    assert_eq!(store.search("", 10, 0).unwrap().len(), 0);
    assert_eq!(tailer::read_offset(&state, "nonexistent.log"), 0);
}

/// The directory pass skips dot-files and subdirectories but still ingests
/// the regular files next to them.
#[test]
fn scan_skips_hidden_and_nested_entries() {
    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    write_lines(&watch.join("seen.log"), &["visible line"]);
    write_lines(&watch.join(".hidden.log"), &["hidden line"]);
    std::fs::create_dir(watch.join("nested")).unwrap();
    write_lines(&watch.join("nested").join("deep.log"), &["nested line"]);

    let running = AtomicBool::new(true);
    tailer::scan_directory(&store, &state, &watch, &running);

    let entries = store.search("", 10, 0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "visible line");
}

/// One unreadable file does not abort the pass over the remaining files.
#[cfg(unix)]
#[test]
fn unreadable_file_does_not_abort_pass() {
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::fs::PermissionsExt;

    // Root ignores permission bits; nothing to observe there.
    if std::fs::metadata("/proc/self").map(|m| m.uid()).unwrap_or(0) == 0 {
        return;
    }

    let (store, dir) = temp_store();
    let (watch, state) = dirs(&dir);
    let locked = watch.join("locked.log");
    write_lines(&locked, &["secret line"]);
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    write_lines(&watch.join("open.log"), &["open line"]);

    let running = AtomicBool::new(true);
    tailer::scan_directory(&store, &state, &watch, &running);

    let entries = store.search("", 10, 0).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].message, "open line");
}
