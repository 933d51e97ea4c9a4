//! logex — system log ingestion, full-text search, and tagging.
//!
//! Thin facade over the workspace crates so the binary and the integration
//! harnesses import everything from one place.
//!
//! # Architecture
//!
//! ```text
//! Journal Follower ──┐
//!                    ├──► Store (SQLite + FTS5) ──► search / show / tag
//! File Tailer ───────┘
//! ```
//!
//! The feed readers run on their own OS threads under the [`Ingestor`];
//! consumers call the [`Store`] from any thread.

pub use logex_core::{config, error, store, types};
pub use logex_core::{Config, LogEntry, Store, StoreError};
pub use logex_feeds::{ingestor, journal, tailer, Ingestor};
