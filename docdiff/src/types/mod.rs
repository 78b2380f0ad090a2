//! Common types used throughout the diff engine.
//!
//! Records flow from producers into the engine, which turns them into classified diffs.

mod diff;
mod record;

pub use diff::*;
pub use record::*;
