//! Ingestor — coordinates the journal follower and the file tailer.
//!
//! Both readers run as plain OS threads sharing one running flag and one
//! `Arc<Store>`. `start` is idempotent; `stop` clears the flag, interrupts
//! the journal stream, and joins both threads before returning, so no reader
//! outlives it.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use logex_core::config::IngestConfig;
use logex_core::Store;

use crate::journal::{self, StreamHandle, CURSOR_FILE};
use crate::tailer;

/// Owns the feed reader threads and their shared cancellation flag.
#[derive(Default)]
pub struct Ingestor {
    running: Arc<AtomicBool>,
    stream: StreamHandle,
    workers: Vec<JoinHandle<()>>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Launch the feed readers. A second call while already running is a
    /// no-op. The journal follower is launched only when the journal feed is
    /// enabled and `journalctl` is present; its absence is expected and
    /// non-fatal.
    pub fn start(&mut self, store: Arc<Store>, config: &IngestConfig) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        if config.journal && journalctl_available() {
            let store = Arc::clone(&store);
            let cursor_path = config.state_dir.join(CURSOR_FILE);
            let running = Arc::clone(&self.running);
            let stream = self.stream.clone();
            self.spawn("logex-journal", move || {
                journal::run(store, &cursor_path, running, stream);
            });
        } else if config.journal {
            tracing::info!("journalctl not found in PATH, skipping journal feed");
        }

        let state_dir = config.state_dir.clone();
        let watch_dir = config.watch_dir.clone();
        let poll_interval = Duration::from_millis(config.poll_interval_ms);
        let running = Arc::clone(&self.running);
        self.spawn("logex-tailer", move || {
            tailer::run(store, state_dir, watch_dir, poll_interval, running);
        });
    }

    /// Stop both readers and wait for them to terminate. Safe to call when
    /// not running.
    pub fn stop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // Unblock the journal follower's blocking read.
        self.stream.interrupt();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("feed reader thread panicked");
            }
        }
    }

    fn spawn(&mut self, name: &str, body: impl FnOnce() + Send + 'static) {
        match std::thread::Builder::new().name(name.to_string()).spawn(body) {
            Ok(handle) => self.workers.push(handle),
            Err(err) => tracing::warn!(error = %err, worker = name, "could not spawn feed reader"),
        }
    }
}

impl Drop for Ingestor {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// journalctl discovery
// ---------------------------------------------------------------------------

/// Whether `journalctl` can be found on the current `PATH`. Sandboxed or
/// minimal environments often lack it; the journal feed is skipped there.
pub fn journalctl_available() -> bool {
    std::env::var_os("PATH")
        .map(|path| binary_in_path("journalctl", &path))
        .unwrap_or(false)
}

fn binary_in_path(name: &str, path: &OsStr) -> bool {
    std::env::split_paths(path).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
