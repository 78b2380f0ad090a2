//! Streaming merge-diff of two key-sorted record sequences.
//!
//! Two producers yield records sorted ascending by id, the engine merges them and classifies
//! every id as unchanged, created, updated or deleted, and a printer renders the diffs. Neither
//! side is ever materialized in memory.
//!
//! The [`pipeline::Pipeline`] drives a complete run on tokio workers, while
//! [`differ::diff_records`] exposes the engine for callers that wire their own channels.

pub mod concurrency;
pub mod config;
pub mod differ;
pub mod error;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod printer;
pub mod producer;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod workers;
