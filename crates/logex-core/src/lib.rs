//! logex-core — storage engine and shared types for logex.
//!
//! This crate owns the durable side of the system: the SQLite-backed
//! [`Store`] with its FTS5 full-text index and tag tables, plus the
//! configuration and error types shared with the feed readers.
//!
//! # Architecture
//!
//! ```text
//! Feed Readers ──► Store (SQLite + FTS5) ──► search / fetch / tag consumers
//! ```
//!
//! The store is the single point of durable truth. Feed readers and consumer
//! threads share one `Arc<Store>`; every statement-issuing operation runs
//! under the store's internal guard.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::StoreError;
pub use store::Store;
pub use types::LogEntry;
