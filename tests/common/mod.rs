//! Shared test utilities for logex integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. Stores and state directories live in per-test temp
//! directories so harnesses can run in parallel.

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
