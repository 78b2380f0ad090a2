//! Testing utilities for diff runs.
//!
//! - [`records`] builds record sequences.
//! - [`producer`] provides producers that fail or stall at a chosen point.
//! - [`printer`] provides printers that fail on demand.
//! - [`pipeline`] creates pipelines with test-friendly settings.
//! - [`notify`] provides timed notifications for coordinating tests with running workers.

pub mod notify;
pub mod pipeline;
pub mod printer;
pub mod producer;
pub mod records;
