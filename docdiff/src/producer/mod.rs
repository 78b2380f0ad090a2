//! Sources of records for each side of a diff.

mod base;
pub mod memory;

pub use base::*;
