//! logex-feeds — log feed readers for logex.
//!
//! Each feed reader runs a blocking ingest loop on its own OS thread, parses
//! raw records into normalized log events, and writes them straight into the
//! shared [`logex_core::Store`]. The [`Ingestor`] owns both reader threads
//! and a shared running flag; `stop()` clears the flag, unblocks the journal
//! stream, and joins the workers before returning.

pub mod ingestor;
pub mod journal;
pub mod tailer;

pub use ingestor::Ingestor;
