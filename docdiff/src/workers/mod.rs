//! Background workers of a diff run.
//!
//! One producer worker per present side feeds records to the differ worker, whose diffs are
//! drained by the printer worker.

pub mod base;
pub mod differ;
pub mod printer;
pub mod producer;
