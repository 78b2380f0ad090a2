//! Configuration objects for diff runs.
//!
//! This module re-exports the configuration types the engine and the printers need.

// Re-exports.
pub use docdiff_config::shared::*;
