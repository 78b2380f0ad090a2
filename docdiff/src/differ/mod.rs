//! The streaming merge-diff engine.

mod merge;

pub use merge::{DiffOptions, diff_records};
